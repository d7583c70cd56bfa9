use std::collections::BTreeMap;

use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::GraphId;
use crate::graph::model::Graph;
use crate::scene::model::{Composition, Property};
use crate::scene::order::layer_graph_ids;

const XXH3_SEED: u64 = 0x5f1d_3c2b_a7e9_0d41;

/// Stable fingerprint of everything that shapes a compiled program.
///
/// Node layout and property values are not hashed: moving a node or changing a keyframe never
/// requires a recompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TopologyFingerprint {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

/// Fingerprint the graphs attached to `composition` plus its layer and property structure.
pub fn fingerprint_topology(
    composition: &Composition,
    graphs: &BTreeMap<GraphId, Graph>,
) -> TopologyFingerprint {
    let mut h = StableHasher::new();
    h.write_str(&composition.id.0);

    h.write_u32(composition.layers.len() as u32);
    for layer in &composition.layers {
        h.write_str(&layer.id.0);
        h.write_u32(layer.properties.len() as u32);
        for p in &layer.properties {
            h.write_str(&p.0);
        }
        h.write_u32(layer.array_modifiers.len() as u32);
        for m in &layer.array_modifiers {
            h.write_str(&m.id.0);
            h.write_str(&m.count.0);
        }
        for graph_id in layer_graph_ids(layer) {
            h.write_str(&graph_id.0);
            match graphs.get(graph_id) {
                Some(g) => {
                    h.write_u8(1);
                    write_graph(&mut h, g);
                }
                None => h.write_u8(0),
            }
        }
    }

    h.write_u32(composition.properties.len() as u32);
    for p in composition.properties.values() {
        write_property_shape(&mut h, p);
    }
    h.finish()
}

fn write_property_shape(h: &mut StableHasher, p: &Property) {
    h.write_str(&p.id().0);
    h.write_str(p.name());
    match p {
        Property::Single { value_type, .. } => {
            h.write_u8(0);
            h.write_json(value_type);
        }
        Property::Compound { components, .. } => {
            h.write_u8(1);
            for c in components {
                h.write_str(&c.0);
            }
        }
        Property::Group { properties, .. } => {
            h.write_u8(2);
            h.write_u32(properties.len() as u32);
            for c in properties {
                h.write_str(&c.0);
            }
        }
    }
}

fn write_graph(h: &mut StableHasher, g: &Graph) {
    h.write_json(&g.owner);
    h.write_u32(g.nodes.len() as u32);
    for node in g.nodes.values() {
        h.write_str(&node.id.0);
        h.write_json(&node.kind);
        h.write_u32(node.inputs.len() as u32);
        for input in &node.inputs {
            h.write_str(&input.name);
            h.write_json(&input.value_type);
            match &input.pointer {
                Some(p) => {
                    h.write_u8(1);
                    h.write_str(&p.node.0);
                    h.write_u64(p.output as u64);
                }
                None => {
                    h.write_u8(0);
                    h.write_json(&input.value);
                }
            }
        }
        h.write_u32(node.outputs.len() as u32);
        for output in &node.outputs {
            h.write_str(&output.name);
            h.write_json(&output.value_type);
        }
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    /// Hash the canonical JSON form of `v` (maps are ordered, so the bytes are stable).
    fn write_json<T: serde::Serialize>(&mut self, v: &T) {
        match serde_json::to_vec(v) {
            Ok(bytes) => {
                self.write_u32(bytes.len() as u32);
                self.write_bytes(&bytes);
            }
            Err(_) => self.write_u8(0xff),
        }
    }

    fn finish(self) -> TopologyFingerprint {
        let v = self.inner.digest128();
        TopologyFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fingerprint.rs"]
mod tests;
