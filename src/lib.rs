//! `rixgl`: a host-side driver that turns a fixed-function, OpenGL-1.x-style
//! immediate-mode API into a binary command stream for a rasterizer
//! accelerator reached over a bus.
//!
//! The two halves of the crate are the vertex pipeline ([`pipeline`],
//! [`clip`], [`raster`], [`lighting`], [`texgen`], built on [`math`] and
//! [`fixed`]) and the display-list assembler ([`assembler`], [`protocol`],
//! [`display_list`]), joined by the [`renderer::IRenderer`] trait. The
//! [`bus::BusAdapter`] trait is the only way a finished list leaves this
//! crate.

pub mod assembler;
pub mod bus;
pub mod clip;
pub mod display_list;
pub mod error;
pub mod fixed;
pub mod lighting;
pub mod math;
pub mod pipeline;
pub mod protocol;
pub mod raster;
pub mod renderer;
pub mod texgen;

pub use assembler::DisplayListAssembler;
pub use bus::BusAdapter;
pub use display_list::{DisplayList, Slot};
pub use error::DriverError;
pub use math::{Mat44, Vec2, Vec3, Vec4};
pub use pipeline::{CullFace, DrawMode, RenderObj, Triangle, VertexPipeline};
pub use raster::RasterizedTriangle;
pub use renderer::IRenderer;
