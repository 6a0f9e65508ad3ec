//! Request and response messages
//!
//! # Request
//!
//! ```text
//! [cmdLen u32][command][propertyCount u32][(keyLen, key, valLen, value) x N]
//! [meshCount u8][mesh record x meshCount]
//! ```
//!
//! Operators send either no mesh (command only) or exactly one. The count is a
//! full byte so multi-object requests fit the same frame.
//!
//! # Response
//!
//! A sequence of items, each starting with an [`ItemTag`] byte:
//!
//! 1. `Mesh` followed by a mesh record, zero or more times
//! 2. optionally `Error` followed by a length-prefixed message
//! 3. `End`, closing the response
//!
//! # Protocol Version
//!
//! Version 1 terminates every response with the explicit `End` item. A peer
//! that closes the connection before `End` has sent a truncated response.

use crate::mesh::MeshRecord;
use crate::property::PropertyBag;

/// Current protocol version string
pub const PROTOCOL_VERSION: &str = "1";

/// Tag byte in front of every response item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemTag {
    /// End of the response
    End = 0x00,
    /// A mesh record follows
    Mesh = 0x01,
    /// A server-side error message follows
    Error = 0x02,
}

impl ItemTag {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::End),
            0x01 => Some(Self::Mesh),
            0x02 => Some(Self::Error),
            _ => None,
        }
    }
}

/// One request to the geometry server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// Operator identifier, e.g. `object.toxicblend_medianaxis`
    pub command: String,
    /// Operator parameters
    pub properties: PropertyBag,
    /// Attached objects
    pub meshes: Vec<MeshRecord>,
}

impl Request {
    /// A request without geometry
    pub fn command_only(command: impl Into<String>, properties: PropertyBag) -> Self {
        Self {
            command: command.into(),
            properties,
            meshes: Vec::new(),
        }
    }

    /// A request carrying one object
    pub fn single_object(
        command: impl Into<String>,
        properties: PropertyBag,
        mesh: MeshRecord,
    ) -> Self {
        Self {
            command: command.into(),
            properties,
            meshes: vec![mesh],
        }
    }

    /// The first attached mesh, if any
    pub fn mesh(&self) -> Option<&MeshRecord> {
        self.meshes.first()
    }

    pub fn is_command_only(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// One item of a response stream
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseItem {
    /// A result object
    Mesh(MeshRecord),
    /// The server could not complete the command
    Error(String),
    /// No more items follow
    End,
}

impl ResponseItem {
    /// Tag written in front of this item
    pub fn tag(&self) -> ItemTag {
        match self {
            ResponseItem::Mesh(_) => ItemTag::Mesh,
            ResponseItem::Error(_) => ItemTag::Error,
            ResponseItem::End => ItemTag::End,
        }
    }
}
