//! Numerical core for SU(N) lattice gauge field evolution, Wilson fermion hopping, and
//! conjugate-gradient inversion.
//!
//! This crate evolves an SU(N) gauge field on a four-dimensional periodic hypercubic
//! lattice via the pseudo-heatbath algorithm, and applies a nearest-neighbour fermion
//! hopping operator to lattice spinor fields together with a conjugate-gradient solver
//! that inverts a self-adjoint fermion operator built from it.
//!
//! ## Invariants
//!
//! - Gauge links produced by the heatbath updater remain unitary with unit determinant
//!   to numerical tolerance ([`group`]'s `uniform_su2`/`heatbath_su2` and their SU(N)
//!   composition in [`heatbath`]).
//! - The only source of non-determinism is the [`rng`] module's `RandomSource`; given
//!   the same seed and the same sequence of calls, every algorithm here is
//!   reproducible bit-for-bit in its own output sequence.
//! - This crate has no file I/O, no logging, and no CLI surface: it is a numerical
//!   kernel meant to be linked into a host simulation driver.

pub mod action;
pub mod cg;
pub mod error;
pub mod fermion;
pub mod field;
pub mod group;
pub mod heatbath;
pub mod hopping;
pub mod layout;
pub mod rng;

/// The scalar field used throughout this crate: double-precision complex.
pub type Complex64 = num_complex::Complex<f64>;

/// A dense `Nc x Nc` colour matrix, the element type of link fields.
pub type ColourMatrix = ndarray::Array2<Complex64>;

/// A dense length-`Nc` colour vector, the per-spin element type of spinor fields.
pub type ColourVector = ndarray::Array1<Complex64>;

/// A dense `Ns x Ns` spin-space matrix (Dirac gamma projectors, etc).
pub type SpinMatrix = ndarray::Array2<Complex64>;

/// A lattice field of one colour matrix per direction, one slot per link.
pub type LinkField = field::LatticeField<ColourMatrix>;

/// A lattice field of one colour vector per spin component.
pub type SpinorField = field::LatticeField<ColourVector>;

pub use error::{CoreError, CoreResult};
pub use layout::Layout;
pub use rng::{rng, RandomSource};
