use anyhow::{anyhow, Result};
use itertools::Itertools;

/// A polygon mesh: a list of points and a list of cells, each cell being a polygon given by the
/// indices of its vertices.
///
/// A mesh is the most convenient way to describe a planar subdivision, and can be turned into a
/// [`Dcel`](crate::Dcel) with [`Dcel::from_mesh`](crate::Dcel::from_mesh).
#[derive(Clone, Debug)]
pub struct Mesh {
    points: Vec<[f64; 2]>,
    cells: Vec<usize>,
    offsets: Offsets,
}

#[derive(Clone, Debug)]
enum Offsets {
    Implicit(usize),
    Explicit(Vec<usize>),
}

/// Iterator over the cells of a [`Mesh`].
pub struct Cells<'a> {
    cells: &'a [usize],
    offsets: &'a Offsets,
    idx: usize,
}

impl<'a> Iterator for Cells<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.idx;
        let (start, end) = match self.offsets {
            Offsets::Implicit(stride) if idx * stride < self.cells.len() => {
                (idx * stride, (idx + 1) * stride)
            }
            Offsets::Explicit(offsets) if idx + 1 < offsets.len() => {
                (offsets[idx], offsets[idx + 1])
            }
            _ => return None,
        };
        self.idx += 1;
        // This iterator can only be created from a valid `Mesh` so there cannot be bounds issues
        Some(&self.cells[start..end])
    }
}

impl Mesh {
    /// Creates a mesh whose cells all have `stride` vertices.
    ///
    /// Fails if `stride` is smaller than 3, if the length of `cells` is not a multiple of
    /// `stride`, or if a cell refers to a point that does not exist.
    pub fn with_stride(points: Vec<[f64; 2]>, cells: Vec<usize>, stride: usize) -> Result<Self> {
        if stride < 3 {
            return Err(anyhow!("Cells need at least 3 vertices, got {}.", stride));
        }
        if cells.len() % stride != 0 {
            return Err(anyhow!(
                "The number of cell indices ({}) is not a multiple of the stride ({}).",
                cells.len(),
                stride
            ));
        }
        check_indices(&points, &cells)?;
        Ok(Self {
            points,
            cells,
            offsets: Offsets::Implicit(stride),
        })
    }

    /// Creates a mesh whose cell `i` is made of the vertices `cells[offsets[i]..offsets[i + 1]]`.
    ///
    /// Fails if the offsets do not start at 0, do not end at `cells.len()`, or describe a cell
    /// with fewer than 3 vertices, or if a cell refers to a point that does not exist.
    pub fn with_offsets(
        points: Vec<[f64; 2]>,
        cells: Vec<usize>,
        offsets: Vec<usize>,
    ) -> Result<Self> {
        if offsets.first() != Some(&0) || offsets.last() != Some(&cells.len()) {
            return Err(anyhow!(
                "Offsets should start at 0 and end at the number of cell indices."
            ));
        }
        if offsets.iter().tuple_windows().any(|(a, b)| a + 3 > *b) {
            return Err(anyhow!("Cells need at least 3 vertices."));
        }
        check_indices(&points, &cells)?;
        Ok(Self {
            points,
            cells,
            offsets: Offsets::Explicit(offsets),
        })
    }

    /// Creates a regular grid of `nx` by `ny` quadrangles covering `[xmin, xmax] x [ymin, ymax]`.
    ///
    /// Cells are numbered from left to right and then from bottom to top.
    pub fn grid(xmin: f64, xmax: f64, ymin: f64, ymax: f64, nx: usize, ny: usize) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(anyhow!("The grid needs at least one cell in each direction."));
        }
        if xmin >= xmax || ymin >= ymax {
            return Err(anyhow!("The grid bounds are empty."));
        }

        let dx = (xmax - xmin) / nx as f64;
        let dy = (ymax - ymin) / ny as f64;
        let points = (0..=ny)
            .cartesian_product(0..=nx)
            .map(|(j, i)| [xmin + i as f64 * dx, ymin + j as f64 * dy])
            .collect();

        let mut cells = Vec::with_capacity(4 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let a = j * (nx + 1) + i;
                let b = a + nx + 1;
                cells.extend([a, a + 1, b + 1, b]);
            }
        }

        Self::with_stride(points, cells, 4)
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn coords(&self, idx: usize) -> [f64; 2] {
        self.points[idx]
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn cell_count(&self) -> usize {
        match &self.offsets {
            Offsets::Implicit(stride) => self.cells.len() / stride,
            Offsets::Explicit(offsets) => offsets.len() - 1,
        }
    }

    pub fn cells(&self) -> Cells<'_> {
        Cells {
            cells: &self.cells,
            offsets: &self.offsets,
            idx: 0,
        }
    }

    /// The coordinates of the vertices of cell `idx`, if it exists.
    pub fn cell_vertices(&self, idx: usize) -> Option<Vec<[f64; 2]>> {
        self.cells()
            .nth(idx)
            .map(|cell| cell.iter().map(|&v| self.points[v]).collect())
    }
}

fn check_indices(points: &[[f64; 2]], cells: &[usize]) -> Result<()> {
    match cells.iter().find(|&&idx| idx >= points.len()) {
        Some(idx) => Err(anyhow!(
            "Cell vertex {} does not exist (there are {} points).",
            idx,
            points.len()
        )),
        None => Ok(()),
    }
}
