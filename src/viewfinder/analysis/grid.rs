/// Fixed-size, row-major grid of per-cell results.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisGrid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Copy + Default> AnalysisGrid<T> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); width as usize * height as usize],
        }
    }

    /// Resizes to `width x height` if needed. Contents are left for the caller to overwrite.
    pub(crate) fn reshape(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells.clear();
            self.cells.resize(width as usize * height as usize, T::default());
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, gx: u32, gy: u32) -> Option<T> {
        if gx >= self.width || gy >= self.height {
            return None;
        }
        self.cells.get(gy as usize * self.width as usize + gx as usize).copied()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }
}
