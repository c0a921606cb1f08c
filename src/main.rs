use helmet_viewer::ViewerConfig;

fn main() -> anyhow::Result<()> {
    helmet_viewer::run(ViewerConfig::default())
}
