//! URL list to merged PDF.
//!
//! [`Orchestrator::convert`] validates a [`ConversionRequest`], renders every
//! URL concurrently into its own artifact, collects outcomes into per-index
//! slots, and hands the ordered [`ArtifactSet`] to the [`OutputAssembler`].

pub mod artifacts;
pub mod assembler;
pub mod naming;
pub mod orchestrator;

pub use artifacts::{ArtifactSet, ConversionRequest, RenderFailure, RenderOutcome, RenderTask};
pub use assembler::{AssembledOutput, AssemblyMode, OutputAssembler};
pub use naming::{Stamp, StampSource, artifact_path, merged_path};
pub use orchestrator::{ConversionReport, Orchestrator};
