//! Embedding table storage backends.
//!
//! Training mutates two `node_count x embedding_size` tables in place. The
//! [`EmbeddingStorage`] trait abstracts where the rows live so the trainer is
//! written against the interface only:
//!
//! - [`HeapStorage`]: dense in-memory buffer, fastest, bounded by RAM.
//! - [`MmapStorage`]: file-backed region via `memmap2`, for graphs whose
//!   tables exceed RAM. Writes go through the mapping; the table is durable
//!   once training completes and the mapping is flushed.
//!
//! Allocation failures on either path surface as resource errors, distinct
//! from configuration errors.

use crate::{Error, Result};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::io;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::path::Path;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Element type of an embedding table: f32 or f64.
///
/// Nonlinear math (sigmoid, log) runs in f64; rows store and accumulate in
/// `Self`, so the precision choice governs table memory and update rounding.
pub trait Scalar:
    sealed::Sealed
    + Copy
    + Send
    + Sync
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    const ZERO: Self;
    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    fn from_f64(value: f64) -> Self {
        value as f32
    }
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    fn from_f64(value: f64) -> Self {
        value
    }
    fn to_f64(self) -> f64 {
        self
    }
}

/// Row-addressable backing store for one embedding table.
pub trait EmbeddingStorage<T: Scalar>: Send {
    /// Number of rows (nodes).
    fn rows(&self) -> usize;

    /// Row width (embedding dimension).
    fn dim(&self) -> usize;

    /// Embedding row of a node.
    fn row(&self, node: usize) -> &[T];

    /// Mutable embedding row of a node.
    fn row_mut(&mut self, node: usize) -> &mut [T];

    /// The whole table as one flat `rows * dim` slice.
    fn as_slice(&self) -> &[T];

    /// Persist pending writes, where the backend has any.
    fn flush(&mut self) -> io::Result<()>;
}

fn table_len(rows: usize, dim: usize) -> Result<usize> {
    rows.checked_mul(dim)
        .ok_or_else(|| Error::Config(format!("table shape {rows} x {dim} overflows")))
}

/// Heap-resident embedding table.
#[derive(Debug, Clone)]
pub struct HeapStorage<T: Scalar> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Scalar> HeapStorage<T> {
    /// Allocate a zeroed `rows x dim` table.
    ///
    /// Uses a fallible reservation so an oversized request surfaces as a
    /// resource error instead of aborting the process.
    pub fn new(rows: usize, dim: usize) -> Result<Self> {
        let len = table_len(rows, dim)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| Error::Resource(io::Error::new(io::ErrorKind::OutOfMemory, e)))?;
        data.resize(len, T::ZERO);
        Ok(Self { data, dim })
    }
}

impl<T: Scalar> EmbeddingStorage<T> for HeapStorage<T> {
    fn rows(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, node: usize) -> &[T] {
        &self.data[node * self.dim..(node + 1) * self.dim]
    }

    fn row_mut(&mut self, node: usize) -> &mut [T] {
        &mut self.data[node * self.dim..(node + 1) * self.dim]
    }

    fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// File-backed embedding table via a writable memory mapping.
#[derive(Debug)]
pub struct MmapStorage<T: Scalar> {
    map: MmapMut,
    rows: usize,
    dim: usize,
    _marker: PhantomData<T>,
}

impl<T: Scalar> MmapStorage<T> {
    /// Create (or truncate) the file at `path` sized for a zeroed
    /// `rows x dim` table and map it writable.
    pub fn create(path: &Path, rows: usize, dim: usize) -> Result<Self> {
        let len = table_len(rows, dim)?;
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::Config(format!("table shape {rows} x {dim} overflows")))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(bytes as u64)?;
        let map = unsafe { MmapMut::map_mut(&file)? };
        // Mappings are page-aligned, which satisfies any float alignment.
        debug_assert_eq!(map.as_ptr() as usize % std::mem::align_of::<T>(), 0);
        Ok(Self { map, rows, dim, _marker: PhantomData })
    }

    fn slice(&self) -> &[T] {
        // Safety: the mapping is exactly rows * dim * size_of::<T>() bytes
        // and page-aligned; T is a plain float with no invalid bit patterns.
        unsafe {
            std::slice::from_raw_parts(self.map.as_ptr() as *const T, self.rows * self.dim)
        }
    }

    fn slice_mut(&mut self) -> &mut [T] {
        // Safety: as in `slice`, and we hold the only handle to the mapping.
        unsafe {
            std::slice::from_raw_parts_mut(self.map.as_mut_ptr() as *mut T, self.rows * self.dim)
        }
    }
}

impl<T: Scalar> EmbeddingStorage<T> for MmapStorage<T> {
    fn rows(&self) -> usize {
        self.rows
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, node: usize) -> &[T] {
        &self.slice()[node * self.dim..(node + 1) * self.dim]
    }

    fn row_mut(&mut self, node: usize) -> &mut [T] {
        let dim = self.dim;
        &mut self.slice_mut()[node * dim..(node + 1) * dim]
    }

    fn as_slice(&self) -> &[T] {
        self.slice()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.map.flush()
    }
}

/// Which side of the objective a returned table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Central (input) node embeddings.
    Central,
    /// Contextual (output) node embeddings.
    Contextual,
}

/// A trained embedding table, read-only after training.
pub struct EmbeddingTable<T: Scalar> {
    role: TableRole,
    storage: Box<dyn EmbeddingStorage<T>>,
}

impl<T: Scalar> EmbeddingTable<T> {
    pub(crate) fn new(role: TableRole, storage: Box<dyn EmbeddingStorage<T>>) -> Self {
        Self { role, storage }
    }

    /// Which table this is; CBOW runs return the contextual table first.
    pub fn role(&self) -> TableRole {
        self.role
    }

    /// Number of rows (nodes).
    pub fn rows(&self) -> usize {
        self.storage.rows()
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.storage.dim()
    }

    /// Embedding of a node.
    pub fn row(&self, node: usize) -> &[T] {
        self.storage.row(node)
    }

    /// The whole table as one flat `rows * dim` slice.
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Copy the table out as one vector per node.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.rows()).map(|n| self.row(n).to_vec()).collect()
    }
}

impl<T: Scalar> std::fmt::Debug for EmbeddingTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingTable")
            .field("role", &self.role)
            .field("rows", &self.rows())
            .field("dim", &self.dim())
            .finish()
    }
}
