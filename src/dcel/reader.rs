//! Textual description of a [`Dcel`].
//!
//! The format has one record per line, blank lines being skipped:
//!
//! ```text
//! v1 (0, 0) e1,2
//! f1 nil e1,2
//! f2 e2,1 nil
//! e1,2 v1 e2,1 f1 e2,3 e3,1
//! ```
//!
//! - a vertex line gives the vertex name, its coordinates and one half-edge leaving it;
//! - a face line gives the face name, its outer boundary and its inner boundaries (`nil` for
//!   none);
//! - a half-edge line gives the half-edge name, then its origin, twin, face, next and prev.
//!
//! Half-edges are named after the vertices they join (`e1,2` goes from `v1` to `v2`). The `v`
//! and `f` prefixes are optional when referring to vertices and faces.

use std::{collections::HashMap, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{Dcel, Face, FaceId, Hedge, HedgeId, Vertex, VertexId};

struct Names<'a> {
    vertices: HashMap<&'a str, VertexId>,
    hedges: HashMap<&'a str, HedgeId>,
    faces: HashMap<&'a str, FaceId>,
}

impl<'a> Names<'a> {
    fn vertex(&self, name: &str) -> Result<VertexId> {
        self.vertices
            .get(name.trim_start_matches('v'))
            .copied()
            .ok_or_else(|| anyhow!("Unknown vertex `{}`.", name))
    }

    fn hedge(&self, name: &str) -> Result<HedgeId> {
        self.hedges
            .get(name.trim_start_matches('e'))
            .copied()
            .ok_or_else(|| anyhow!("Unknown half-edge `{}`.", name))
    }

    fn face(&self, name: &str) -> Result<FaceId> {
        self.faces
            .get(name.trim_start_matches('f'))
            .copied()
            .ok_or_else(|| anyhow!("Unknown face `{}`.", name))
    }

    fn optional_hedge(&self, name: &str) -> Result<Option<HedgeId>> {
        if name == "nil" {
            Ok(None)
        } else {
            self.hedge(name).map(Some)
        }
    }
}

impl FromStr for Dcel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lines: Vec<_> = s
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        // First pass: give an index to every record
        let mut names = Names {
            vertices: HashMap::new(),
            hedges: HashMap::new(),
            faces: HashMap::new(),
        };
        for &(number, line) in &lines {
            let name = line.split_whitespace().next().unwrap_or_default();
            let duplicate = match name.as_bytes().first() {
                Some(b'v') => {
                    let id = VertexId(names.vertices.len());
                    names.vertices.insert(&name[1..], id).is_some()
                }
                Some(b'f') => {
                    let id = FaceId(names.faces.len());
                    names.faces.insert(&name[1..], id).is_some()
                }
                Some(b'e') => {
                    let id = HedgeId(names.hedges.len());
                    names.hedges.insert(&name[1..], id).is_some()
                }
                _ => bail!("Line {}: unexpected record `{}`.", number, line),
            };
            if duplicate {
                bail!("Line {}: `{}` is defined twice.", number, name);
            }
        }

        // Second pass: resolve the references
        let mut vertices = Vec::with_capacity(names.vertices.len());
        let mut hedges = Vec::with_capacity(names.hedges.len());
        let mut faces = Vec::with_capacity(names.faces.len());
        for &(number, line) in &lines {
            let context = || format!("Line {}: `{}`", number, line);
            match line.as_bytes()[0] {
                b'v' => vertices.push(read_vertex(line, &names).with_context(context)?),
                b'f' => faces.push(read_face(line, &names).with_context(context)?),
                _ => hedges.push(read_hedge(line, &names).with_context(context)?),
            }
        }

        Ok(Dcel::new(vertices, hedges, faces)?)
    }
}

fn read_vertex(line: &str, names: &Names) -> Result<Vertex> {
    let (open, close) = line
        .find('(')
        .zip(line.find(')'))
        .ok_or_else(|| anyhow!("Coordinates should be given as `(x, y)`."))?;
    let coords: Vec<f64> = line
        .get(open + 1..close)
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .context("Invalid coordinates.")?;
    let [x, y] = coords[..] else {
        bail!("Expected 2 coordinates, got {}.", coords.len());
    };

    let hedge = match line[close + 1..].split_whitespace().collect::<Vec<_>>()[..] {
        [] => None,
        [hedge] => names.optional_hedge(hedge)?,
        _ => bail!("Expected a single incident half-edge."),
    };

    Ok(Vertex {
        coords: [x, y],
        hedge,
    })
}

fn read_face(line: &str, names: &Names) -> Result<Face> {
    let mut fields = line.split_whitespace().skip(1);
    let outer = names.optional_hedge(
        fields
            .next()
            .ok_or_else(|| anyhow!("Missing outer boundary."))?,
    )?;
    let inner = fields
        .map(|name| names.optional_hedge(name))
        .filter_map(Result::transpose)
        .collect::<Result<_>>()?;

    Ok(Face { outer, inner })
}

fn read_hedge(line: &str, names: &Names) -> Result<Hedge> {
    let fields: Vec<_> = line.split_whitespace().collect();
    let [_, origin, twin, face, next, prev] = fields[..] else {
        bail!(
            "Expected a name followed by origin, twin, face, next and prev, got {} fields.",
            fields.len()
        );
    };

    Ok(Hedge {
        origin: names.vertex(origin)?,
        twin: names.optional_hedge(twin)?,
        face: names.face(face)?,
        next: names.hedge(next)?,
        prev: names.hedge(prev)?,
    })
}
