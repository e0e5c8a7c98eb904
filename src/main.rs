use std::path::PathBuf;

use anyhow::{bail, Context};
use casaview::gfx::scene::{loader::load_obj_into, SceneGraph};
use casaview::{CasaApp, ViewerConfig};

const USAGE: &str = "usage: casaview [MODEL.obj] [--config viewer.json]";

struct Args {
    model: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        model: None,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => bail!("unknown option '{arg}'\n{USAGE}"),
            _ if args.model.is_none() => args.model = Some(PathBuf::from(arg)),
            _ => bail!("more than one model given\n{USAGE}"),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let mut scene = SceneGraph::new();
    let root = scene.root();
    let model_root = match &args.model {
        Some(path) => load_obj_into(&mut scene, root, path)?,
        None => {
            log::warn!("No model given, starting with an empty scene");
            scene.add_node(root, "model")
        }
    };

    let app = CasaApp::new(scene, model_root, config)?;
    app.run()?;
    Ok(())
}
