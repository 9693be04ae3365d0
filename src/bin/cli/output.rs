use clap::ValueEnum;
use serde::Serialize;
use smartpix::dto::{AuthResponse, EditResponse, ImageSummary, MeResponse, StatsResponse, UploadResponse};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs, tokens or counts)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Could not serialize output: {}", err),
    }
}

/// Prints the result of a signup or login
pub fn print_auth(auth: &AuthResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", auth.token);
                return;
            }
            println!("ID:    {}", auth.id);
            println!("Email: {}", auth.email);
            println!("Token: {}", auth.token);
            println!();
            println!("export SMARTPIX_TOKEN={}", auth.token);
        }
        OutputFormat::Json => print_json(auth),
    }
}

pub fn print_me(me: &MeResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", me.id);
                return;
            }
            println!("ID:       {}", me.id);
            println!("Email:    {}", me.email);
            println!("Username: {}", me.username);
            println!("Joined:   {}", me.created_at);
        }
        OutputFormat::Json => print_json(me),
    }
}

pub fn print_upload(upload: &UploadResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", upload.image_id);
                return;
            }
            println!("Uploaded {} as {}", upload.name, upload.image_id);
            println!("URL: {}", upload.url);
        }
        OutputFormat::Json => print_json(upload),
    }
}

/// Prints a list of images in the specified format
pub fn print_images(images: &[ImageSummary], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if images.is_empty() {
                if !config.quiet {
                    println!("No images found.");
                }
                return;
            }
            if config.quiet {
                for image in images {
                    println!("{}", image.id);
                }
                return;
            }
            let max_id = images.iter().map(|i| i.id.len()).max().unwrap_or(2);
            println!("{:<width$}  {:<10}  {:<20}  NAME", "ID", "EDIT", "UPLOADED", width = max_id);
            for image in images {
                println!(
                    "{:<width$}  {:<10}  {:<20}  {}",
                    image.id,
                    image.edit_type.as_deref().unwrap_or("-"),
                    image.created_at.format("%Y-%m-%d %H:%M:%S"),
                    image.name,
                    width = max_id
                );
            }
        }
        OutputFormat::Json => print_json(images),
    }
}

/// Prints a single image in the specified format
pub fn print_image(image: &ImageSummary, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", image.id);
                return;
            }
            println!("ID:       {}", image.id);
            println!("Name:     {}", image.name);
            println!("Uploaded: {}", image.created_at);
            println!("Original: {}", image.original_image_url);
            if let (Some(url), Some(edit_type)) = (&image.edited_image_url, &image.edit_type) {
                println!("Edited:   {} ({})", url, edit_type);
            }
        }
        OutputFormat::Json => print_json(image),
    }
}

pub fn print_edit(edit: &EditResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", edit.edit_id);
                return;
            }
            println!("Applied {} at intensity {}", edit.edit_type, edit.intensity);
            println!("Edit:   {}", edit.edit_id);
            println!("Result: {}", edit.edited_url);
        }
        OutputFormat::Json => print_json(edit),
    }
}

pub fn print_stats(stats: &StatsResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", stats.total_images);
                return;
            }
            println!("Images:     {}", stats.total_images);
            println!("Processed:  {}", stats.processed_images);
            println!("Edits:      {}", stats.total_edits);
            println!("Storage:    {:.1} MB", stats.storage_used);
        }
        OutputFormat::Json => print_json(stats),
    }
}

/// Prints a success message in the specified format
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({"status": "ok", "message": message})),
    }
}
