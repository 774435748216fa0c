use std::env;

// TODO: accept more than one argument
fn main() {
    let name = env::args().nth(1).unwrap();
    println!("hello {}", sample::greet(&name));
}
