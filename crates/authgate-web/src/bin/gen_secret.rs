//! Prints a fresh session secret for `AUTHGATE_SESSION_SECRET`.

fn main() {
    println!("{}", authgate_core::token::random_token());
}
