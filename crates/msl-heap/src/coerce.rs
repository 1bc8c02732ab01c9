//! Value coercions and the arithmetic/comparison operators built on
//! them (§4.3). These live on [`Heap`] rather than [`Value`] itself
//! because formatting an Object or Array has to walk its entries.

use crate::entities::Function;
use crate::heap::Heap;
use crate::value::Value;

impl Heap {
    pub fn to_boolean(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Function(_) => true,
            Value::Object(h) => self.object(*h).map(|o| !o.is_empty()).unwrap_or(false),
            Value::Array(h) => self.array(*h).map(|a| !a.is_empty()).unwrap_or(false),
        }
    }

    pub fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Null => 0.0,
            Value::Boolean(b) => if *b { 1.0 } else { 0.0 },
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Value::Function(_) | Value::Object(_) | Value::Array(_) => f64::NAN,
        }
    }

    pub fn to_display_string(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Function(_) => "Function".to_string(),
            Value::Object(h) => match self.object(*h) {
                Some(obj) => {
                    let entries: Vec<String> = obj
                        .properties
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k.as_str(), self.to_display_string(v)))
                        .collect();
                    format!("{{{}}}", entries.join(", "))
                }
                None => "{}".to_string(),
            },
            Value::Array(h) => match self.array(*h) {
                Some(arr) => {
                    let entries: Vec<String> =
                        arr.elements.iter().map(|v| self.to_display_string(v)).collect();
                    format!("[{}]", entries.join(", "))
                }
                None => "[]".to_string(),
            },
        }
    }

    /// `+`: string concatenation if either side is a String, else
    /// numeric addition.
    pub fn add(&self, left: &Value, right: &Value) -> Value {
        if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
            let mut s = self.to_display_string(left);
            s.push_str(&self.to_display_string(right));
            Value::string(s)
        } else {
            Value::Number(self.to_number(left) + self.to_number(right))
        }
    }

    pub fn sub(&self, left: &Value, right: &Value) -> Value {
        Value::Number(self.to_number(left) - self.to_number(right))
    }

    pub fn mul(&self, left: &Value, right: &Value) -> Value {
        Value::Number(self.to_number(left) * self.to_number(right))
    }

    pub fn div(&self, left: &Value, right: &Value) -> Value {
        Value::Number(self.to_number(left) / self.to_number(right))
    }

    /// IEEE remainder (`fmod`), matching `%`'s behavior on the host
    /// float type rather than Euclidean modulo.
    pub fn rem(&self, left: &Value, right: &Value) -> Value {
        Value::Number(self.to_number(left) % self.to_number(right))
    }

    pub fn negate(&self, value: &Value) -> Value {
        Value::Number(-self.to_number(value))
    }

    pub fn unary_plus(&self, value: &Value) -> Value {
        Value::Number(self.to_number(value))
    }

    pub fn not(&self, value: &Value) -> Value {
        Value::Boolean(!self.to_boolean(value))
    }

    /// Numeric otherwise, lexicographic if both sides are strings.
    pub fn less_than(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right, |a, b| a < b, |a, b| a < b)
    }

    pub fn less_than_or_equal(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right, |a, b| a <= b, |a, b| a <= b)
    }

    pub fn greater_than(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right, |a, b| a > b, |a, b| a > b)
    }

    pub fn greater_than_or_equal(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right, |a, b| a >= b, |a, b| a >= b)
    }

    fn compare(
        &self,
        left: &Value,
        right: &Value,
        strings: impl Fn(&str, &str) -> bool,
        numbers: impl Fn(f64, f64) -> bool,
    ) -> bool {
        if let (Value::String(a), Value::String(b)) = (left, right) {
            strings(a, b)
        } else {
            numbers(self.to_number(left), self.to_number(right))
        }
    }

    /// `==`: handle identity for two Objects or two Arrays, lexicographic
    /// for two Strings, numeric otherwise. Two Functions are not a
    /// handle-identity carve-out (only Object/Array are, per §4.3) — they
    /// fall through to the numeric case, where `toNumber` on a Function is
    /// always `NaN`, so two Functions compare unequal even to themselves.
    pub fn equals(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => self.to_number(left) == self.to_number(right),
        }
    }

    pub fn not_equals(&self, left: &Value, right: &Value) -> bool {
        !self.equals(left, right)
    }

    pub fn is_function(&self, value: &Value) -> Option<&Function> {
        match value {
            Value::Function(h) => self.function(*h),
            _ => None,
        }
    }
}

/// Numbers print with a fixed six fractional digits (§6 end-to-end
/// scenarios, e.g. `7.000000`), matching the source's `std::to_string`
/// on a `double` rather than Rust's shortest-round-trip `Display`.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        format!("{n:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Stack;

    #[test]
    fn concatenates_when_either_side_is_a_string() {
        let heap = Heap::new();
        let result = heap.add(&Value::string("x="), &Value::Number(3.0));
        assert_eq!(heap.to_display_string(&result), "x=3.000000");
    }

    #[test]
    fn adds_numerically_when_neither_side_is_a_string() {
        let heap = Heap::new();
        let result = heap.add(&Value::Number(2.0), &Value::Boolean(true));
        assert!(matches!(result, Value::Number(n) if n == 3.0));
    }

    #[test]
    fn to_boolean_treats_empty_object_as_falsey() {
        let mut heap = Heap::new();
        let stack = Stack::new();
        let handle = heap.allocate_object(&stack);
        assert!(!heap.to_boolean(&Value::Object(handle)));
        heap.object_mut(handle).unwrap().set(msl_util::Symbol::intern("k"), Value::Null);
        assert!(heap.to_boolean(&Value::Object(handle)));
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let heap = Heap::new();
        assert!(heap.less_than(&Value::string("apple"), &Value::string("banana")));
        assert!(!heap.less_than(&Value::string("10"), &Value::string("9")));
    }

    #[test]
    fn numeric_comparison_is_numeric_even_through_string_coercion() {
        let heap = Heap::new();
        assert!(heap.less_than(&Value::string("9"), &Value::Number(10.0)));
    }

    #[test]
    fn equals_compares_objects_by_handle_identity() {
        let mut heap = Heap::new();
        let stack = Stack::new();
        let a = heap.allocate_object(&stack);
        let b = heap.allocate_object(&stack);
        assert!(heap.equals(&Value::Object(a), &Value::Object(a)));
        assert!(!heap.equals(&Value::Object(a), &Value::Object(b)));
    }

    #[test]
    fn equals_on_two_functions_is_never_true_even_to_itself() {
        let mut heap = Heap::new();
        let stack = Stack::new();
        let f = heap.allocate_builtin(&stack, crate::entities::Builtin::Print);
        assert!(!heap.equals(&Value::Function(f), &Value::Function(f)));
    }

    #[test]
    fn to_number_parses_strings_and_yields_nan_on_failure() {
        let heap = Heap::new();
        assert_eq!(heap.to_number(&Value::string("42")), 42.0);
        assert!(heap.to_number(&Value::string("nope")).is_nan());
    }
}
