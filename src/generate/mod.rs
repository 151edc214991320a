mod component;
mod output;
mod renderer;

pub use component::{to_pascal_case, wrap_component};
pub use output::Output;
pub use renderer::{RenderState, Rendered, Renderer, camelize, render_attrs};
