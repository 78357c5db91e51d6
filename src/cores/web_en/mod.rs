pub mod payload;
pub use payload::{Candidate, PLACEHOLDER, generate};
pub mod selector;
pub use selector::{RandomSource, RequestOptions, Selector, ThreadRandom};
pub mod fetcher;
pub use fetcher::{FetchResponse, Fetcher, FetcherConfig, HttpTransport, Outcome, dispatch};
pub mod governor;
pub use governor::{CooldownScope, Governor, GovernorConfig};

mod governor_tests_cooldown;
