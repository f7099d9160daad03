use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use macroquad::texture::Texture2D;
use pattern_recall_rendering::Viewport;
use serde::Deserialize;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Optional images and viewport placement read from an asset manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetManifest {
    backdrop: Option<PathBuf>,
    selection: Option<PathBuf>,
    viewport: Viewport,
}

impl AssetManifest {
    /// Returns the default manifest path relative to the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Loads the manifest at the provided path, resolving images relative to it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read asset manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, &base)
            .with_context(|| format!("invalid asset manifest {}", manifest_path.display()))
    }

    /// Parses manifest contents, resolving image paths against `base`.
    pub fn parse(contents: &str, base: &Path) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse asset manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported asset manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }

        let viewport = match manifest.viewport {
            Some(table) => Viewport::new(table.x, table.y, table.width, table.height)
                .context("asset manifest viewport is invalid")?,
            None => Viewport::default(),
        };

        Ok(Self {
            backdrop: manifest.images.backdrop.map(|path| base.join(path)),
            selection: manifest.images.selection.map(|path| base.join(path)),
            viewport,
        })
    }

    /// Image drawn behind the whole window.
    #[must_use]
    pub fn backdrop(&self) -> Option<&Path> {
        self.backdrop.as_deref()
    }

    /// Image drawn over picked cells.
    #[must_use]
    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    /// Placement of the playing surface within the window.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    #[serde(default)]
    images: ImageTable,
    viewport: Option<ViewportTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageTable {
    backdrop: Option<String>,
    selection: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewportTable {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Textures uploaded for the images named by the manifest.
#[derive(Debug, Default)]
pub(crate) struct ImageSet {
    pub(crate) backdrop: Option<Texture2D>,
    pub(crate) selection: Option<Texture2D>,
}

impl ImageSet {
    /// Uploads every image, keeping the solid-colour fallback for those that fail.
    pub(crate) fn load(manifest: &AssetManifest) -> Self {
        Self::load_with(manifest, &mut default_loader)
    }

    fn load_with(
        manifest: &AssetManifest,
        loader: &mut impl FnMut(&Path) -> Result<Texture2D>,
    ) -> Self {
        Self {
            backdrop: load_optional("backdrop", manifest.backdrop(), loader),
            selection: load_optional("selection", manifest.selection(), loader),
        }
    }
}

fn load_optional(
    name: &str,
    path: Option<&Path>,
    loader: &mut impl FnMut(&Path) -> Result<Texture2D>,
) -> Option<Texture2D> {
    let path = path?;
    match loader(path) {
        Ok(texture) => {
            log::debug!("loaded {name} image from {}", path.display());
            Some(texture)
        }
        Err(error) => {
            log::warn!("{name} image unavailable, using fallback: {error:#}");
            None
        }
    }
}

fn default_loader(path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read image asset at {}", path.display()))?;
    let pixels = decode_rgba(&bytes)
        .with_context(|| format!("failed to decode image asset at {}", path.display()))?;
    let (width, height) = texture_size(&pixels)?;
    Ok(Texture2D::from_rgba8(width, height, pixels.as_raw()))
}

/// Decodes PNG or JPEG bytes into RGBA pixels without touching the GPU.
fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn texture_size(pixels: &RgbaImage) -> Result<(u16, u16)> {
    let (width, height) = pixels.dimensions();
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => bail!("image of {width}x{height} pixels exceeds the texture limit"),
    }
}
