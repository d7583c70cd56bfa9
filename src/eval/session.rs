use std::collections::BTreeMap;

use crate::compile::composition::compile_composition_flow;
use crate::compile::fingerprint::{TopologyFingerprint, fingerprint_topology};
use crate::compile::program::CompiledProgram;
use crate::eval::recompute::{PassOutcome, compute_composition};
use crate::eval::store::PropertyStore;
use crate::foundation::core::{FrameIndex, GraphId};
use crate::foundation::error::{CompositionError, FlowResult};
use crate::graph::model::Graph;
use crate::scene::model::Composition;

/// Compiled state of one composition, rebuilt only when its topology changes.
///
/// While the last compile failed, passes are blocked and the store keeps whatever it held.
#[derive(Debug)]
pub struct FlowSession {
    program: Option<CompiledProgram>,
    fingerprint: TopologyFingerprint,
    errors: Vec<CompositionError>,
}

impl FlowSession {
    /// Compile `composition` with `graphs`.
    pub fn new(composition: &Composition, graphs: &BTreeMap<GraphId, Graph>) -> Self {
        let fingerprint = fingerprint_topology(composition, graphs);
        let (program, errors) = compile(composition, graphs);
        Self {
            program,
            fingerprint,
            errors,
        }
    }

    /// Recompile if the topology fingerprint changed. Returns `true` when a compile ran.
    #[tracing::instrument(skip_all, fields(composition = %composition.id))]
    pub fn refresh(&mut self, composition: &Composition, graphs: &BTreeMap<GraphId, Graph>) -> bool {
        let fingerprint = fingerprint_topology(composition, graphs);
        if fingerprint == self.fingerprint {
            return false;
        }
        tracing::debug!(hi = fingerprint.hi, lo = fingerprint.lo, "topology changed, recompiling");
        let (program, errors) = compile(composition, graphs);
        self.program = program;
        self.errors = errors;
        self.fingerprint = fingerprint;
        true
    }

    /// Run one recomputation pass at `frame` into `store`.
    pub fn compute(
        &self,
        composition: &Composition,
        frame: FrameIndex,
        store: &mut PropertyStore,
    ) -> FlowResult<PassOutcome> {
        if !self.errors.is_empty() {
            return Ok(PassOutcome::Blocked {
                errors: self.errors.clone(),
            });
        }
        compute_composition(self.program.as_ref(), composition, frame, store)
    }

    /// Errors of the last compile.
    pub fn errors(&self) -> &[CompositionError] {
        &self.errors
    }

    /// Program of the last successful compile.
    pub fn program(&self) -> Option<&CompiledProgram> {
        self.program.as_ref()
    }

    /// Fingerprint the current program was compiled from.
    pub fn fingerprint(&self) -> TopologyFingerprint {
        self.fingerprint
    }

    /// `true` when the last compile succeeded.
    pub fn can_render(&self) -> bool {
        self.errors.is_empty()
    }
}

fn compile(
    composition: &Composition,
    graphs: &BTreeMap<GraphId, Graph>,
) -> (Option<CompiledProgram>, Vec<CompositionError>) {
    match compile_composition_flow(composition, graphs) {
        Ok(program) => (Some(program), Vec::new()),
        Err(errors) => (None, errors),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/session.rs"]
mod tests;
