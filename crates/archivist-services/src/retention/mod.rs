mod scanner;

pub use scanner::find_expired;
