//! Import services
//!
//! - `reconciler` / `card_reconciler`: merge engine (sets, cards, faces and
//!   their children)
//! - `face_matcher`: incoming ↔ persisted face pairing
//! - `import_coordinator`: streaming, fan-out and first-error handling

mod card_reconciler;
pub mod face_matcher;
pub mod import_coordinator;
pub mod reconciler;

pub use face_matcher::{match_faces, FaceMatches};
pub use import_coordinator::ImportCoordinator;
pub use reconciler::Reconciler;
