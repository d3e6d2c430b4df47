pub mod dex;
pub mod envelope;
pub mod normalize;
pub mod operation;

pub use dex::{DexTool, TOOL_DESCRIPTION, TOOL_NAME};
pub use envelope::{ResponseEnvelope, Status};
pub use normalize::QuoteResult;
pub use operation::{Operation, StructuredRequest, SwapRequest};
