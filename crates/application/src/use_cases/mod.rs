pub mod dispatch;
pub mod handle_dns_query;

pub use dispatch::{AnswerSource, Dispatcher, DispatcherBuilder, Resolution, HOSTS_TTL};
pub use handle_dns_query::HandleDnsQueryUseCase;
