//! Position-addressed edits over `redraft-model` documents.
//!
//! A [`Step`] is one atomic change (replace a range, add or remove a mark,
//! change a node's markup). Steps can be applied, inverted, mapped through
//! other changes and merged with their neighbours. A [`Transform`]
//! collects applied steps along with the documents between them and the
//! combined [`Mapping`].

pub mod map;
pub mod step;
mod transform;

pub use map::{MapResult, Mapping, StepMap};
pub use step::{AddMarkStep, RemoveMarkStep, ReplaceStep, SetNodeMarkupStep, Step, StepError};
pub use transform::Transform;
