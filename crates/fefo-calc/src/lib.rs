//! # FEFO Allocation Engine
//!
//! 先到期先出（FEFO）批次分配引擎

pub mod allocator;
pub mod document;
pub mod eligibility;
pub mod ordering;

// Re-export 主要類型
pub use allocator::FefoAllocator;
pub use document::DocumentPlanner;
pub use eligibility::{Eligibility, EligibilityFilter, EligibleBatch};
pub use ordering::FefoOrdering;
