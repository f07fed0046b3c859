pub mod ports;
pub mod refresh_use_case;
pub mod search_use_case;
pub mod sync_use_case;

pub use refresh_use_case::{RefreshReport, RefreshUseCase};
pub use search_use_case::{SearchOutcome, SearchRequest, SearchUseCase};
pub use sync_use_case::{SyncReport, SyncUseCase};
