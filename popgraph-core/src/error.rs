//! Error types for the popgraph core library.
//!
//! Parameter infeasibility and generation failures are corrected or fallen
//! back from with logged diagnostics and never surface here. The enums below
//! only cover API misuse and malformed input.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error produced when constructing, mutating or decoding a [`crate::Geometry`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GeometryError {
    /// A geometry must contain at least one node.
    #[error("geometry size must be at least 1")]
    ZeroSize,
    /// A node index exceeded the population size.
    #[error("node {node} is out of range for a population of {size}")]
    NodeOutOfRange {
        /// Offending node index.
        node: usize,
        /// Population size of the geometry.
        size: usize,
    },
    /// A self-loop was requested on a store that does not permit them.
    #[error("self-loop on node {node} is not permitted")]
    SelfLoopNotPermitted {
        /// Node on which the loop was requested.
        node: usize,
    },
    /// The persisted encoding lists a different number of nodes than declared.
    #[error("encoded geometry declares {expected} nodes but lists {found}")]
    EncodingSizeMismatch {
        /// Size declared by the encoding.
        expected: usize,
        /// Number of neighbour lists found.
        found: usize,
    },
    /// The persisted encoding references a node outside the population.
    #[error("encoded link {node}->{target} exceeds population size {size}")]
    EncodedLinkOutOfRange {
        /// Source node of the link.
        node: usize,
        /// Target node that is out of range.
        target: usize,
        /// Population size declared by the encoding.
        size: usize,
    },
    /// A regeneratable encoding carried a descriptor that does not parse.
    #[error("descriptor `{descriptor}` cannot be regenerated")]
    UnknownDescriptor {
        /// Descriptor text as stored in the encoding.
        descriptor: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`GeometryError`] variants.
    enum GeometryErrorCode for GeometryError {
        /// A geometry must contain at least one node.
        ZeroSize => ZeroSize => "GEOMETRY_ZERO_SIZE",
        /// A node index exceeded the population size.
        NodeOutOfRange => NodeOutOfRange { .. } => "GEOMETRY_NODE_OUT_OF_RANGE",
        /// A self-loop was requested on a store that does not permit them.
        SelfLoopNotPermitted => SelfLoopNotPermitted { .. } => "GEOMETRY_SELF_LOOP_NOT_PERMITTED",
        /// The persisted encoding lists a different number of nodes than declared.
        EncodingSizeMismatch => EncodingSizeMismatch { .. } => "GEOMETRY_ENCODING_SIZE_MISMATCH",
        /// The persisted encoding references a node outside the population.
        EncodedLinkOutOfRange => EncodedLinkOutOfRange { .. } => "GEOMETRY_ENCODED_LINK_OUT_OF_RANGE",
        /// A regeneratable encoding carried a descriptor that does not parse.
        UnknownDescriptor => UnknownDescriptor { .. } => "GEOMETRY_UNKNOWN_DESCRIPTOR",
    }
}

/// Error produced when configuring or starting a [`crate::Layout`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LayoutError {
    /// A configuration value was outside its admissible range.
    #[error("invalid layout configuration `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
    /// The geometry handed to the layout engine has no nodes.
    #[error("cannot lay out an empty geometry")]
    EmptyGeometry,
}

define_error_codes! {
    /// Stable codes describing [`LayoutError`] variants.
    enum LayoutErrorCode for LayoutError {
        /// A configuration value was outside its admissible range.
        InvalidConfig => InvalidConfig { .. } => "LAYOUT_INVALID_CONFIG",
        /// The geometry handed to the layout engine has no nodes.
        EmptyGeometry => EmptyGeometry => "LAYOUT_EMPTY_GEOMETRY",
    }
}

/// Convenient alias for results returned by geometry operations.
pub type Result<T> = core::result::Result<T, GeometryError>;
