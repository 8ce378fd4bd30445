use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use thumbvault_imaging::DynamicImage;
use thumbvault_provider::ImageProvider;
use thumbvault_service::{ImageService, ServiceConfig};
use thumbvault_types::{ImageFormat, ImageId};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let json = matches!(cli.format, OutputFormat::Json);
    // Resizing a file needs no configured provider.
    if let Command::Resize(args) = &cli.command {
        return cmd_resize(args, json);
    }

    let service = open_service(&cli.config, cli.root.as_deref())?;
    let provider = cli.provider.as_str();
    match &cli.command {
        Command::Save(args) => cmd_save(&service, provider, args, json),
        Command::Get(args) => cmd_get(&service, provider, args, json),
        Command::Thumbnail(args) => cmd_thumbnail(&service, provider, args, json),
        Command::Delete(args) => cmd_delete(&service, provider, args, json),
        Command::Purge(args) => cmd_purge(&service, provider, args, json),
        Command::Resize(args) => cmd_resize(args, json),
        Command::Providers => cmd_providers(&service, json),
        Command::Stats => cmd_stats(&service, provider, json),
    }
}

/// Load the config file, or fall back to a cached file-system provider at
/// `root` when the file does not exist.
fn open_service(config: &Path, root: Option<&Path>) -> anyhow::Result<ImageService> {
    if config.exists() {
        return ImageService::load(config)
            .with_context(|| format!("failed to load {}", config.display()));
    }
    match root {
        Some(root) => Ok(ImageService::from_config(ServiceConfig::file_system(root, true))?),
        None => bail!(
            "configuration file {} not found (pass --config or --root)",
            config.display()
        ),
    }
}

fn parse_id(raw: &str) -> anyhow::Result<ImageId> {
    ImageId::parse(raw).with_context(|| format!("'{raw}' is not an image id"))
}

/// Format for an output file: its extension if recognised, else `fallback`.
fn output_format_for(path: &Path, fallback: ImageFormat) -> ImageFormat {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ImageFormat::from_name(ext).ok())
        .unwrap_or(fallback)
}

fn write_image(path: &Path, image: &DynamicImage, fallback: ImageFormat) -> anyhow::Result<()> {
    let format = output_format_for(path, fallback);
    let bytes = thumbvault_imaging::encode(image, format)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn cmd_save(
    service: &ImageService,
    provider: &str,
    args: &SaveArgs,
    json: bool,
) -> anyhow::Result<()> {
    let id = match &args.id {
        Some(raw) => {
            let id = parse_id(raw)?;
            service.save_image_file_with_id(provider, &id, &args.file)?;
            id
        }
        None => service.save_image_file(provider, &args.file)?,
    };
    if json {
        println!("{}", json!({ "id": id, "file": args.file }));
    } else {
        println!(
            "{} Saved {} as {}",
            "✓".green().bold(),
            args.file.display(),
            id.to_string().yellow()
        );
    }
    Ok(())
}

fn cmd_get(
    service: &ImageService,
    provider: &str,
    args: &GetArgs,
    json: bool,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let Some(image) = service.get_image(provider, &id)? else {
        bail!("image {id} not found");
    };
    let fallback = service.provider(provider)?.image_format();
    write_image(&args.output, &image, fallback)?;
    report_written(&args.output, &image, json);
    Ok(())
}

fn cmd_thumbnail(
    service: &ImageService,
    provider: &str,
    args: &ThumbnailArgs,
    json: bool,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let (width, height) = (args.bounds.width, args.bounds.height);
    let Some(image) = service.get_thumbnail_image(provider, &id, width, height)? else {
        bail!("image {id} not found");
    };
    let fallback = service.provider(provider)?.image_format();
    write_image(&args.output, &image, fallback)?;
    report_written(&args.output, &image, json);
    Ok(())
}

fn cmd_delete(
    service: &ImageService,
    provider: &str,
    args: &IdArgs,
    json: bool,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    service.delete_image(provider, &id)?;
    if json {
        println!("{}", json!({ "deleted": id }));
    } else {
        println!("{} Deleted {}", "✓".green().bold(), id.to_string().yellow());
    }
    Ok(())
}

fn cmd_purge(
    service: &ImageService,
    provider: &str,
    args: &IdArgs,
    json: bool,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let removed = service.purge_thumbnails(provider, &id)?;
    if json {
        println!("{}", json!({ "id": id, "removed": removed }));
        return Ok(());
    }
    match removed {
        Some(count) => println!(
            "{} Removed {} cached thumbnail(s) of {}",
            "✓".green().bold(),
            count,
            id.to_string().yellow()
        ),
        None => println!(
            "Provider {} does not cache thumbnails.",
            service.provider(provider)?.name().bold()
        ),
    }
    Ok(())
}

fn cmd_resize(args: &ResizeArgs, json: bool) -> anyhow::Result<()> {
    let image = thumbvault_imaging::create_thumbnail_from_file(
        &args.file,
        args.bounds.width,
        args.bounds.height,
    )
    .with_context(|| format!("failed to resize {}", args.file.display()))?;
    write_image(&args.output, &image, ImageFormat::default())?;
    report_written(&args.output, &image, json);
    Ok(())
}

fn cmd_providers(service: &ImageService, json: bool) -> anyhow::Result<()> {
    let default = service.default_provider_name();
    let mut rows = Vec::new();
    for name in service.provider_names() {
        let kind = service.provider_kind(name)?;
        let format = service.provider(name)?.image_format();
        rows.push((name, kind, format));
    }

    if json {
        let list: Vec<_> = rows
            .iter()
            .map(|(name, kind, format)| {
                json!({
                    "name": name,
                    "kind": kind,
                    "image_format": format,
                    "default": *name == default,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    for (name, kind, format) in rows {
        if name == default {
            println!("* {} ({}, {})", name.green().bold(), kind, format);
        } else {
            println!("  {} ({}, {})", name, kind, format);
        }
    }
    Ok(())
}

fn cmd_stats(service: &ImageService, provider: &str, json: bool) -> anyhow::Result<()> {
    let stats = service.stats(provider)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Provider {} ({}, {})", stats.name.bold(), stats.kind, stats.image_format);
    if let Some(inventory) = stats.inventory {
        println!(
            "  Stored: {} original(s), {} thumbnail(s), {} other file(s), {} bytes",
            inventory.originals.to_string().bold(),
            inventory.thumbnails.to_string().bold(),
            inventory.other,
            inventory.bytes
        );
    }
    if let Some(cache) = stats.cache {
        println!(
            "  Cache: {} hit(s), {} miss(es), {} write(s)",
            cache.hits.to_string().green(),
            cache.misses.to_string().yellow(),
            cache.writes
        );
    }
    if let Some(count) = stats.images_in_memory {
        println!("  In memory: {} image(s)", count.to_string().bold());
    }
    Ok(())
}

fn report_written(path: &Path, image: &DynamicImage, json: bool) {
    if json {
        println!(
            "{}",
            json!({ "output": path, "width": image.width(), "height": image.height() })
        );
    } else {
        println!(
            "{} Wrote {} ({}x{})",
            "✓".green().bold(),
            path.display(),
            image.width(),
            image.height()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["thumbvault"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    fn sample_png(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join("sample.png");
        let image = DynamicImage::new_rgb8(width, height);
        let bytes = thumbvault_imaging::encode(&image, ImageFormat::Png).unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(output_format_for(Path::new("a.JPG"), ImageFormat::Png), ImageFormat::Jpeg);
        assert_eq!(output_format_for(Path::new("a.gif"), ImageFormat::Png), ImageFormat::Gif);
        assert_eq!(output_format_for(Path::new("a.dat"), ImageFormat::Bmp), ImageFormat::Bmp);
        assert_eq!(output_format_for(Path::new("noext"), ImageFormat::Png), ImageFormat::Png);
    }

    #[test]
    fn missing_config_without_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_service(&dir.path().join("none.toml"), None).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn root_fallback_builds_cached_provider() {
        let dir = tempfile::tempdir().unwrap();
        let service = open_service(&dir.path().join("none.toml"), Some(dir.path())).unwrap();
        assert_eq!(
            service.provider_kind("").unwrap(),
            thumbvault_service::ProviderKind::CachedFileSystem
        );
    }

    #[test]
    fn save_then_thumbnail_through_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("store");
        std::fs::create_dir(&storage).unwrap();
        let root = storage.to_str().unwrap();
        let config = dir.path().join("absent.toml");
        let config = config.to_str().unwrap();
        let source = sample_png(dir.path(), 800, 1000);
        let id = ImageId::new().to_string();

        let source = source.to_str().unwrap();
        run(&["-c", config, "--root", root, "save", source, "--id", &id]).unwrap();

        let thumb = dir.path().join("thumb.png");
        run(&[
            "-c", config, "--root", root, "thumbnail", &id, "-W", "200", "-H", "200", "-o",
            thumb.to_str().unwrap(),
        ])
        .unwrap();
        let image = thumbvault_imaging::decode_file(&thumb).unwrap();
        assert_eq!((image.width(), image.height()), (160, 200));

        run(&["-c", config, "--root", root, "purge", &id]).unwrap();
        run(&["-c", config, "--root", root, "delete", &id]).unwrap();
        let out = dir.path().join("gone.png");
        let out = out.to_str().unwrap();
        assert!(run(&["-c", config, "--root", root, "get", &id, "-o", out]).is_err());
    }

    #[test]
    fn resize_needs_no_provider() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_png(dir.path(), 400, 100);
        let out = dir.path().join("small.gif");
        run(&[
            "--config", "/nonexistent/thumbvault.toml", "resize", source.to_str().unwrap(),
            "--width", "100", "-o", out.to_str().unwrap(),
        ])
        .unwrap();
        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"GIF8"));
        let image = thumbvault_imaging::decode(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (100, 25));
    }

    #[test]
    fn bad_id_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let args = ["--root", root, "-c", "/nonexistent.toml", "delete", "not-an-id"];
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("not an image id"));
    }
}
