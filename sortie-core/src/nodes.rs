//! The node-vectorized evaluation contract.
//!
//! A component is configured for `N` nodes, the discrete evaluation points
//! along a trajectory segment.
//! Per-node variables are arrays of length `N`; scalar variables have length one.
//!
//! Derivative structure follows directly from that split:
//!
//! - A per-node law `y[i] = f(x[i])` has a [`Structure::DiagonalPerNode`] partial,
//!   with `N` nonzeros at `(i, i)`.
//! - A scalar broadcast `y[i] = g(p)` has a [`Structure::DenseBlock`] partial,
//!   with one nonzero per output element, all in the single input column.
//!
//! The two structures are never mixed within one partial.

use std::num::NonZeroUsize;

use ndarray::Array1;

/// The number of evaluation nodes a component is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeCount(NonZeroUsize);

impl NodeCount {
    /// Returns `None` for zero nodes.
    #[must_use]
    pub fn new(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Whether a registered variable is a single value or has one value per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Scalar,
    PerNode,
}

impl ShapeKind {
    /// Resolves this kind to a concrete shape for `nodes`.
    #[must_use]
    pub fn resolve(self, nodes: NodeCount) -> Shape {
        match self {
            Self::Scalar => Shape::Scalar,
            Self::PerNode => Shape::Vector(nodes.get()),
        }
    }
}

/// The concrete shape of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector(usize),
}

impl Shape {
    /// Returns the number of elements.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector(n) => n,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// The structural shape of one declared partial derivative block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Structure {
    /// `output[i]` depends only on `input[i]`.
    DiagonalPerNode,
    /// Every element of the output depends on a scalar input.
    DenseBlock,
}

impl Structure {
    /// Checks that this structure fits the given output and input shapes.
    ///
    /// # Errors
    ///
    /// Returns a short reason when the shapes cannot carry this structure.
    pub fn check(self, output: Shape, input: Shape) -> Result<(), &'static str> {
        match (self, output, input) {
            (Self::DiagonalPerNode, Shape::Vector(n), Shape::Vector(m)) if n == m => Ok(()),
            (Self::DiagonalPerNode, _, _) => {
                Err("a diagonal partial needs per-node output and input of equal length")
            }
            (Self::DenseBlock, _, Shape::Scalar) => Ok(()),
            (Self::DenseBlock, _, Shape::Vector(_)) => Err("a dense block needs a scalar input"),
        }
    }

    /// Returns the number of structural nonzeros for a block with this output shape.
    #[must_use]
    pub fn nonzeros(self, output: Shape) -> usize {
        output.len()
    }

    /// Returns the `(row, col)` coordinates of each nonzero within the block.
    ///
    /// The order matches the order of the partial's value array.
    pub fn coordinates(self, output: Shape) -> impl Iterator<Item = (usize, usize)> {
        (0..output.len()).map(move |i| match self {
            Self::DiagonalPerNode => (i, i),
            Self::DenseBlock => (i, 0),
        })
    }
}

/// Broadcasts a scalar over every element of `shape`.
#[must_use]
pub fn broadcast(value: f64, shape: Shape) -> Array1<f64> {
    Array1::from_elem(shape.len(), value)
}
