//! Simple timing utility, active only with the `profile` feature

use std::time::Instant;

pub struct Timer {
    #[allow(dead_code)]
    name: &'static str,
    #[allow(dead_code)]
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        #[cfg(feature = "profile")]
        eprintln!("  * {name}");

        Timer {
            name,
            start: Instant::now(),
        }
    }

    pub fn stop(&self) {
        #[cfg(feature = "profile")]
        eprintln!("  * {} {:?}", self.name, self.start.elapsed());
    }

    pub fn print(msg: &str) {
        #[cfg(feature = "profile")]
        eprintln!("  * {msg}");
        let _ = msg;
    }
}
