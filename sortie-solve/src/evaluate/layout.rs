use ndarray::{Array1, s};
use sortie_core::{Declaration, Values, Variable, VariableDecl};

/// A contiguous run of rows or columns owned by one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub variable: Variable,
    pub offset: usize,
    pub len: usize,
}

impl Block {
    /// Returns the index range covered by this block.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Maps declared outputs to row blocks and declared inputs to column blocks.
///
/// Blocks are laid out in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    rows: Vec<Block>,
    cols: Vec<Block>,
}

impl Layout {
    /// Lays out the outputs and inputs of `declaration`.
    #[must_use]
    pub fn new(declaration: &Declaration) -> Self {
        Self {
            rows: blocks(declaration.outputs()),
            cols: blocks(declaration.inputs()),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Block] {
        &self.rows
    }

    #[must_use]
    pub fn cols(&self) -> &[Block] {
        &self.cols
    }

    #[must_use]
    pub fn row(&self, variable: Variable) -> Option<&Block> {
        self.rows.iter().find(|b| b.variable == variable)
    }

    #[must_use]
    pub fn col(&self, variable: Variable) -> Option<&Block> {
        self.cols.iter().find(|b| b.variable == variable)
    }

    /// Returns `(rows, cols)` of the full Jacobian.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (total(&self.rows), total(&self.cols))
    }

    /// Concatenates output values into one vector in row order.
    ///
    /// Outputs absent from `values` are left as zeros.
    #[must_use]
    pub fn flatten_outputs(&self, values: &Values) -> Array1<f64> {
        flatten(&self.rows, values)
    }
}

fn blocks(decls: &[VariableDecl]) -> Vec<Block> {
    let mut offset = 0;
    decls
        .iter()
        .map(|decl| {
            let block = Block {
                variable: decl.variable,
                offset,
                len: decl.len(),
            };
            offset += decl.len();
            block
        })
        .collect()
}

fn total(blocks: &[Block]) -> usize {
    blocks.last().map_or(0, |b| b.offset + b.len)
}

fn flatten(blocks: &[Block], values: &Values) -> Array1<f64> {
    let mut flat = Array1::zeros(total(blocks));
    for block in blocks {
        if let Some(v) = values.get(block.variable).filter(|v| v.len() == block.len) {
            flat.slice_mut(s![block.range()]).assign(v);
        }
    }
    flat
}
