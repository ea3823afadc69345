pub mod content;
pub mod depends;
pub mod form;
pub mod step;

pub use content::ContentNode;
pub use depends::{Condition, DependsOn};
pub use form::{FormSpec, SpecError};
pub use step::{StepId, StepSpec};
