/// Backend that validates and journals calls without drawing.
pub mod null;
/// CPU rasteriser backend.
pub mod software;
