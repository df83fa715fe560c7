pub mod decompress;
pub mod drivers;
pub mod error;
pub(crate) mod rate_limit;
pub mod retrieval;
pub mod session;

pub use decompress::{convert, convert_directory, xml_path_for, ConversionSummary};
pub use drivers::{
    default_drivers, RamiLeviDriver, SessionCredentials, ShufersalDriver, SourceDriver,
    VictoryDriver,
};
pub use error::ScraperError;
pub use retrieval::RetrievalService;
pub use session::{Page, Session, SessionCookie};
