#![forbid(unsafe_code)]

//! `chaseplot` turns pointer-chasing benchmark records into annotated latency charts and a
//! per-cache-level summary table.
//!
//! # Features
//!
//! - `render`: enable chart layout + SVG output (`chaseplot::render`, `chaseplot::pipeline`)
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use chaseplot_core::*;

#[cfg(feature = "render")]
pub mod pipeline;

#[cfg(feature = "render")]
pub mod render {
    pub use chaseplot_render::model::ChartLayout;
    pub use chaseplot_render::svg::SvgRenderOptions;
    pub use chaseplot_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use chaseplot_render::{LayoutOptions, layout_chart, render_chart_svg};

    #[cfg(feature = "raster")]
    pub mod raster;

    use chaseplot_core::{CacheBoundaries, Dataset, FigureSpec, StyleContext, select};
    use std::fmt;
    use std::path::{Path, PathBuf};
    use std::str::FromStr;

    #[derive(Debug, thiserror::Error)]
    pub enum ChartError {
        #[error(transparent)]
        Data(#[from] chaseplot_core::Error),
        #[error(transparent)]
        Render(#[from] chaseplot_render::Error),
        #[cfg(feature = "raster")]
        #[error(transparent)]
        Raster(#[from] raster::RasterError),
        #[error("I/O error on {}: {source}", .path.display())]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("unknown output format `{value}` (expected svg, png, jpg or pdf)")]
        UnknownFormat { value: String },
        #[error("{format} output requires the `raster` feature")]
        FormatUnavailable { format: ArtifactFormat },
    }

    pub type Result<T> = std::result::Result<T, ChartError>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ArtifactFormat {
        Svg,
        Png,
        Jpg,
        Pdf,
    }

    impl ArtifactFormat {
        pub fn extension(self) -> &'static str {
            match self {
                Self::Svg => "svg",
                Self::Png => "png",
                Self::Jpg => "jpg",
                Self::Pdf => "pdf",
            }
        }

        /// Parses a comma-separated list such as `svg,png`, dropping duplicates.
        pub fn parse_list(text: &str) -> Result<Vec<ArtifactFormat>> {
            let mut out = Vec::new();
            for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let format = part.parse()?;
                if !out.contains(&format) {
                    out.push(format);
                }
            }
            if out.is_empty() {
                return Err(ChartError::UnknownFormat {
                    value: text.to_string(),
                });
            }
            Ok(out)
        }
    }

    impl FromStr for ArtifactFormat {
        type Err = ChartError;

        fn from_str(s: &str) -> Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "svg" => Ok(Self::Svg),
                "png" => Ok(Self::Png),
                "jpg" | "jpeg" => Ok(Self::Jpg),
                "pdf" => Ok(Self::Pdf),
                _ => Err(ChartError::UnknownFormat {
                    value: s.to_string(),
                }),
            }
        }
    }

    impl fmt::Display for ArtifactFormat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.extension())
        }
    }

    /// One file written for a figure.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Artifact {
        pub format: ArtifactFormat,
        pub path: PathBuf,
        pub bytes: usize,
    }

    #[derive(Debug, Clone)]
    pub struct RenderOptions {
        pub boundaries: CacheBoundaries,
        pub layout: LayoutOptions,
        pub svg: SvgRenderOptions,
        pub formats: Vec<ArtifactFormat>,
        #[cfg(feature = "raster")]
        pub raster: raster::RasterOptions,
    }

    impl Default for RenderOptions {
        fn default() -> Self {
            Self {
                boundaries: CacheBoundaries::DEFAULT,
                layout: LayoutOptions::default(),
                svg: SvgRenderOptions::default(),
                #[cfg(feature = "raster")]
                formats: vec![ArtifactFormat::Svg, ArtifactFormat::Png],
                #[cfg(not(feature = "raster"))]
                formats: vec![ArtifactFormat::Svg],
                #[cfg(feature = "raster")]
                raster: raster::RasterOptions::default(),
            }
        }
    }

    /// Resolves, selects and lays out one figure.
    pub fn layout_figure(
        dataset: &Dataset,
        spec: &FigureSpec,
        ctx: &StyleContext,
        options: &RenderOptions,
    ) -> Result<ChartLayout> {
        spec.validate()?;
        let names = spec.resolve_series(dataset)?;
        let selection = select(dataset, &names, spec.skip, ctx)?;
        if !selection.missing().is_empty() {
            tracing::debug!(
                figure = %spec.name,
                missing = ?selection.missing(),
                "some requested series are not in the dataset"
            );
        }
        Ok(layout_chart(
            spec,
            &selection,
            &options.boundaries,
            &options.layout,
        )?)
    }

    /// [`layout_figure`] followed by SVG serialization.
    pub fn render_figure_svg(
        dataset: &Dataset,
        spec: &FigureSpec,
        ctx: &StyleContext,
        options: &RenderOptions,
    ) -> Result<String> {
        let layout = layout_figure(dataset, spec, ctx, options)?;
        Ok(render_chart_svg(&layout, &options.svg)?)
    }

    fn encode(svg: &str, format: ArtifactFormat, options: &RenderOptions) -> Result<Vec<u8>> {
        match format {
            ArtifactFormat::Svg => Ok(svg.as_bytes().to_vec()),
            #[cfg(feature = "raster")]
            ArtifactFormat::Png => Ok(raster::svg_to_png(svg, &options.raster)?),
            #[cfg(feature = "raster")]
            ArtifactFormat::Jpg => Ok(raster::svg_to_jpeg(svg, &options.raster)?),
            #[cfg(feature = "raster")]
            ArtifactFormat::Pdf => Ok(raster::svg_to_pdf(svg)?),
            #[cfg(not(feature = "raster"))]
            other => {
                let _ = options;
                Err(ChartError::FormatUnavailable { format: other })
            }
        }
    }

    /// Writes `<out_dir>/<name>.<ext>` for every requested format, creating `out_dir` first.
    pub fn write_figure(
        out_dir: &Path,
        name: &str,
        svg: &str,
        options: &RenderOptions,
    ) -> Result<Vec<Artifact>> {
        std::fs::create_dir_all(out_dir).map_err(|source| ChartError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut artifacts = Vec::with_capacity(options.formats.len());
        for &format in &options.formats {
            let bytes = encode(svg, format, options)?;
            let path = out_dir.join(format!("{name}.{}", format.extension()));
            std::fs::write(&path, &bytes).map_err(|source| ChartError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "saved {format}");
            artifacts.push(Artifact {
                format,
                path,
                bytes: bytes.len(),
            });
        }
        Ok(artifacts)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn format_lists_parse_and_dedupe() {
            assert_eq!(
                ArtifactFormat::parse_list("svg, PNG,jpeg,svg").unwrap(),
                [ArtifactFormat::Svg, ArtifactFormat::Png, ArtifactFormat::Jpg]
            );
            assert!(matches!(
                ArtifactFormat::parse_list("gif"),
                Err(ChartError::UnknownFormat { .. })
            ));
            assert!(ArtifactFormat::parse_list(" , ").is_err());
        }
    }
}
