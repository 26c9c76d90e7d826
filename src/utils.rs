use itertools::Itertools;

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

/// `"a, b, c"`
pub fn comma_list<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().join(", ")
}


/// Wall-clock reporting of the stages of a command-line run
pub mod timing {

    use super::group_digits;
    use std::io::Write;
    use std::time::{Duration, Instant};

    pub struct Progress {
        previous: Instant,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// `"<message> ... "`, left open for `done`
        pub fn start(&mut self, message: &str) {
            print!("{message} ... ");
            std::io::stdout().flush().ok();
            self.lap();
        }

        /// As `start`, for stages which print output of their own
        pub fn startln(&mut self, message: &str) {
            println!("{message} ...");
            self.lap();
        }

        pub fn done(&mut self) {
            println!("{}", in_ms(self.lap()));
        }

        pub fn done_with_message(&mut self, message: &str) {
            println!("{message}: {}", in_ms(self.lap()));
        }

        /// Time since the previous lap; starts the next one
        fn lap(&mut self) -> Duration {
            let now = Instant::now();
            let elapsed = now - self.previous;
            self.previous = now;
            elapsed
        }
    }

    pub(crate) fn in_ms(t: Duration) -> String { format!("{} ms", group_digits(t.as_millis())) }
}
