//! Where asset bytes come from and how far along their download is.

use anyhow::{Context, bail};

/// A resolved asset location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Absolute `http(s)` URL.
    Remote(reqwest::Url),
    /// Path relative to the asset root, `/`-separated.
    Local { root: String, path: String },
}

impl AssetSource {
    /// Absolute `http(s)` URLs stay remote, everything else lives under `root`.
    pub fn resolve(name: &str, root: &str) -> anyhow::Result<Self> {
        if name.starts_with("data:") {
            bail!("embedded data URIs are not supported");
        }
        match reqwest::Url::parse(name) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) => bail!("unsupported asset scheme `{}` in {name}", url.scheme()),
            Err(_) => Ok(Self::Local {
                root: root.trim_end_matches('/').to_string(),
                path: name.trim_start_matches("./").to_string(),
            }),
        }
    }

    /// Resolves a URI found inside this asset (glTF buffers and images) relative to it.
    pub fn sibling(&self, uri: &str) -> anyhow::Result<Self> {
        if uri.starts_with("data:") {
            bail!("embedded data URIs are not supported");
        }
        match self {
            Self::Remote(url) => {
                let joined = url
                    .join(uri)
                    .with_context(|| format!("cannot resolve {uri} against {url}"))?;
                Ok(Self::Remote(joined))
            }
            Self::Local { root, path } => {
                if let Ok(url) = reqwest::Url::parse(uri) {
                    return Self::resolve(url.as_str(), root);
                }
                let dir = path.rsplit_once('/').map(|(dir, _)| dir);
                let path = match dir {
                    Some(dir) => format!("{dir}/{uri}"),
                    None => uri.to_string(),
                };
                Ok(Self::Local {
                    root: root.clone(),
                    path,
                })
            }
        }
    }

    /// Short name used in labels and log lines.
    pub fn file_name(&self) -> &str {
        let full = match self {
            Self::Remote(url) => url.path(),
            Self::Local { path, .. } => path.as_str(),
        };
        full.rsplit('/').next().unwrap_or(full)
    }

    /// File extension in lower case, used as an image format hint.
    pub fn extension(&self) -> Option<String> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local { root, path } => write!(f, "{root}/{path}"),
        }
    }
}

/// Byte counter that turns chunk sizes into a fraction in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    total: Option<u64>,
    loaded: u64,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            loaded: 0,
        }
    }

    pub fn advance(&mut self, bytes: u64) -> Option<f32> {
        self.loaded += bytes;
        self.fraction()
    }

    /// `None` while the total size is unknown.
    pub fn fraction(&self) -> Option<f32> {
        self.total
            .map(|total| (self.loaded as f64 / total as f64).clamp(0.0, 1.0) as f32)
    }

    pub fn is_known(&self) -> bool {
        self.total.is_some()
    }
}

/// Splits one overall progress bar across several files fetched one after another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StagedProgress {
    stages: usize,
    completed: usize,
}

impl StagedProgress {
    pub fn new(stages: usize) -> Self {
        Self {
            stages: stages.max(1),
            completed: 0,
        }
    }

    /// Overall fraction while the current stage is `stage_fraction` done.
    pub fn within(&self, stage_fraction: f32) -> f32 {
        ((self.completed as f32 + stage_fraction.clamp(0.0, 1.0)) / self.stages as f32).min(1.0)
    }

    pub fn complete_stage(&mut self) -> f32 {
        self.completed = (self.completed + 1).min(self.stages);
        self.within(0.0)
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, path: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{origin}/{root}/"))?;
    Ok(base.join(path)?)
}

/// Fetches the whole asset, reporting progress whenever the total size is known
/// and `1.0` once all bytes have arrived.
pub async fn load_binary<P>(source: &AssetSource, mut on_progress: P) -> anyhow::Result<Vec<u8>>
where
    P: FnMut(f32),
{
    let data = match source {
        AssetSource::Remote(url) => fetch_url(url.clone(), &mut on_progress).await?,
        #[cfg(target_arch = "wasm32")]
        AssetSource::Local { root, path } => {
            fetch_url(format_url(root, path)?, &mut on_progress).await?
        }
        #[cfg(not(target_arch = "wasm32"))]
        AssetSource::Local { root, path } => {
            let path = std::path::Path::new("./").join(root).join(path);
            read_file(&path, &mut on_progress).await?
        }
    };
    on_progress(1.0);
    Ok(data)
}

#[cfg(not(target_arch = "wasm32"))]
async fn fetch_url<P: FnMut(f32)>(url: reqwest::Url, on_progress: &mut P) -> anyhow::Result<Vec<u8>> {
    let mut response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?;
    let mut tracker = ProgressTracker::new(response.content_length());
    let mut data = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        data.extend_from_slice(&chunk);
        if let Some(fraction) = tracker.advance(chunk.len() as u64) {
            on_progress(fraction);
        }
    }
    Ok(data)
}

// The browser hands the body over in one piece.
#[cfg(target_arch = "wasm32")]
async fn fetch_url<P: FnMut(f32)>(url: reqwest::Url, _on_progress: &mut P) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(not(target_arch = "wasm32"))]
async fn read_file<P: FnMut(f32)>(path: &std::path::Path, on_progress: &mut P) -> anyhow::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;
    let total = file.metadata().await?.len();
    let mut tracker = ProgressTracker::new(Some(total));
    let mut data = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
        if let Some(fraction) = tracker.advance(read as u64) {
            on_progress(fraction);
        }
    }
    Ok(data)
}
