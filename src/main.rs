fn main() {
    mousewatch_lib::run()
}
