fn main() {
    std::process::exit(msl_drv::main());
}
