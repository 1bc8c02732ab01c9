//! msl-eval — the tree-walking evaluator: takes a parsed [`msl_ast::Program`]
//! and a heap/stack, and runs it to completion against caller-supplied
//! I/O seams.

mod error;
mod evaluator;
mod signal;

pub use error::RuntimeError;
pub use evaluator::Evaluator;
pub use signal::Signal;

use msl_ast::Program;
use msl_util::{LineReader, OutputSink};

/// Convenience entry point: builds a fresh [`Evaluator`] and runs
/// `program` against it. Most callers — the driver, integration tests —
/// only ever need one evaluator per program run, so this spares them
/// constructing one by hand.
pub fn run(
    program: &Program,
    output: &mut dyn OutputSink,
    input: &mut dyn LineReader,
) -> Result<(), RuntimeError> {
    let mut evaluator = Evaluator::new(output, input);
    evaluator.run(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msl_util::{BufferSink, FixedLines, Handler, NullSink};

    fn run_source(source: &str) -> Result<String, RuntimeError> {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize(source, &mut handler);
        let program = msl_par::parse(tokens, &mut handler).expect("source parses");
        let mut output = BufferSink::default();
        let mut input = FixedLines::new(Vec::<String>::new());
        run(&program, &mut output, &mut input)?;
        Ok(output.out)
    }

    #[test]
    fn prints_arithmetic_results() {
        let out = run_source("print 1 + 2 * 3;").unwrap();
        assert_eq!(out, "7.000000\n");
    }

    #[test]
    fn string_concatenation_via_plus() {
        let out = run_source(r#"let a = "foo"; let b = 3; print a + b;"#).unwrap();
        assert_eq!(out, "foo3.000000\n");
    }

    #[test]
    fn if_else_chooses_the_right_branch() {
        let out = run_source(
            r#"
            let x = 5;
            if (x > 10) { print "big"; } else { print "small"; }
            "#,
        )
        .unwrap();
        assert_eq!(out, "small\n");
    }

    #[test]
    fn while_loop_accumulates() {
        let out = run_source(
            r#"
            let i = 0;
            let sum = 0;
            while (i < 5) {
                sum = sum + i;
                i = i + 1;
            }
            print sum;
            "#,
        )
        .unwrap();
        assert_eq!(out, "10.000000\n");
    }

    #[test]
    fn for_loop_break_and_continue() {
        let out = run_source(
            r#"
            for (let i = 0; i < 3; i = i + 1) { if (i == 1) continue; print i; }
            "#,
        )
        .unwrap();
        assert_eq!(out, "0.000000\n2.000000\n");
    }

    #[test]
    fn do_while_runs_the_body_at_least_once() {
        let out = run_source(
            r#"
            let i = 0;
            do {
                print i;
                i = i + 1;
            } while (i < 0);
            "#,
        )
        .unwrap();
        assert_eq!(out, "0.000000\n");
    }

    #[test]
    fn user_functions_return_values() {
        let out = run_source(
            r#"
            let add = (a, b) { return a + b; };
            print add(2, 3);
            "#,
        )
        .unwrap();
        assert_eq!(out, "5.000000\n");
    }

    #[test]
    fn recursive_calls_resolve_the_function_via_the_frame_it_was_defined_in() {
        let out = run_source(
            r#"
            let f = (n) { if (n <= 1) return 1; return n * f(n - 1); };
            print f(5);
            "#,
        )
        .unwrap();
        assert_eq!(out, "120.000000\n");
    }

    #[test]
    fn functions_do_not_capture_their_defining_environment() {
        let out = run_source(
            r#"
            let make = () {
                let secret = 7;
                return () { return secret; };
            };
            let f = make();
            print f();
            "#,
        );
        assert!(out.is_err());
    }

    #[test]
    fn object_and_array_literals_round_trip_through_members() {
        let out = run_source(
            r#"
            let o = { a: 1, b: "two" };
            let arr = [1, 2, 3];
            print o.a;
            print o.b;
            print arr[1];
            "#,
        )
        .unwrap();
        assert_eq!(out, "1.000000\ntwo\n2.000000\n");
    }

    #[test]
    fn compound_assignment_on_an_array_element_reads_then_writes() {
        let out = run_source(
            r#"
            let xs = [10, 20, 30];
            xs[1] += 5;
            print xs[1];
            print xs;
            "#,
        )
        .unwrap();
        assert_eq!(out, "25.000000\n[10.000000, 25.000000, 30.000000]\n");
    }

    #[test]
    fn postfix_increment_on_an_object_property_yields_the_old_value_but_stores_the_new() {
        let out = run_source(
            r#"
            let o = { x: 1 };
            o.x++;
            print o.x;
            "#,
        )
        .unwrap();
        assert_eq!(out, "2.000000\n");
    }

    #[test]
    fn array_index_out_of_range_is_a_runtime_error() {
        let result = run_source("let arr = [1, 2]; print arr[5];");
        assert!(result.is_err());
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let result = run_source("print missing;");
        assert!(result.is_err());
    }

    #[test]
    fn increment_requires_a_numeric_operand() {
        let result = run_source(r#"let s = "x"; s++;"#);
        assert!(result.is_err());
    }

    #[test]
    fn prefix_and_postfix_increment_differ_in_their_value() {
        let out = run_source(
            r#"
            let i = 0;
            print i++;
            print i;
            print ++i;
            "#,
        )
        .unwrap();
        assert_eq!(out, "0.000000\n1.000000\n2.000000\n");
    }

    #[test]
    fn compound_assignment_reads_then_writes() {
        let out = run_source(
            r#"
            let x = 10;
            x += 5;
            print x;
            "#,
        )
        .unwrap();
        assert_eq!(out, "15.000000\n");
    }

    #[test]
    fn an_array_of_objects_crossing_the_gc_threshold_keeps_every_element_alive() {
        // Each object literal disables/re-enables GC around its own
        // construction; nesting them inside an outer array literal
        // must not let an inner re-enable arm a collection while the
        // (not-yet-rooted) outer array is still being built.
        let mut source = String::from("let arr = [");
        for i in 0..25 {
            if i > 0 {
                source.push(',');
            }
            source.push_str(&format!("{{ n: {i} }}"));
        }
        source.push_str("]; print arr[24].n;");

        let out = run_source(&source).unwrap();
        assert_eq!(out, "24.000000\n");
    }

    #[test]
    fn the_read_builtin_returns_null_at_end_of_input() {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize("print Read();", &mut handler);
        let program = msl_par::parse(tokens, &mut handler).unwrap();
        let mut output = BufferSink::default();
        let mut input = FixedLines::new(Vec::<String>::new());
        run(&program, &mut output, &mut input).unwrap();
        assert_eq!(output.out, "null\n");
    }

    #[test]
    fn the_read_builtin_returns_supplied_lines_in_order() {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize("print Read(); print Read();", &mut handler);
        let program = msl_par::parse(tokens, &mut handler).unwrap();
        let mut output = BufferSink::default();
        let mut input = FixedLines::new(["first", "second"]);
        run(&program, &mut output, &mut input).unwrap();
        assert_eq!(output.out, "first\nsecond\n");
    }

    #[test]
    fn a_large_array_literal_keeps_every_element_through_construction() {
        let mut source = String::from("let arr = [");
        for i in 0..40 {
            if i > 0 {
                source.push(',');
            }
            source.push_str(&i.to_string());
        }
        source.push_str("]; print arr[39];");

        let out = run_source(&source).unwrap();
        assert_eq!(out, "39.000000\n");
    }

    #[test]
    fn string_equality_uses_the_intuitive_sense_not_the_sources_inverted_one() {
        let out = run_source(
            r#"
            print "abc" == "abc";
            print "abc" == "xyz";
            "#,
        )
        .unwrap();
        assert_eq!(out, "true\nfalse\n");
    }

    #[test]
    fn print_statement_and_print_builtin_agree_on_formatting() {
        let out = run_source(
            r#"
            print 1 == 1;
            print null;
            print 1 / 0;
            "#,
        )
        .unwrap();
        assert_eq!(out, "true\nnull\nInfinity\n");
    }

    #[test]
    fn a_null_sink_discards_output_without_panicking() {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize("print 1;", &mut handler);
        let program = msl_par::parse(tokens, &mut handler).unwrap();
        let mut output = NullSink;
        let mut input = FixedLines::new(Vec::<String>::new());
        assert!(run(&program, &mut output, &mut input).is_ok());
    }
}
