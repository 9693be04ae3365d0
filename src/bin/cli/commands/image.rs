use std::path::PathBuf;

use clap::Subcommand;

use crate::client::SmartPixClient;
use crate::output::{self, OutputConfig};

/// Image commands
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// Upload an image file
    Upload {
        /// Path of a PNG, JPEG or WebP file
        path: PathBuf,
    },
    /// List your images
    List,
    /// Show one image
    Show {
        /// The image ID
        id: String,
    },
    /// Apply an edit to an image
    Edit {
        /// The image ID
        id: String,
        /// One of: enhance, restore, retouch, style, background, colorize
        #[clap(long = "type")]
        edit_type: String,
        /// Strength from 0 to 100 (server default 50)
        #[clap(long)]
        intensity: Option<i64>,
    },
    /// Delete an image with all its edits
    Delete {
        /// The image ID
        id: String,
    },
    /// Download the latest edit of an image
    Download {
        /// The image ID
        id: String,
        /// Download the original upload instead
        #[clap(long)]
        original: bool,
        /// Where to write the file
        #[clap(long, short)]
        output: PathBuf,
    },
    /// Show image, edit and storage totals
    Stats,
}

/// Executes an image command
pub async fn execute(
    client: &SmartPixClient,
    cmd: ImageCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ImageCommands::Upload { path } => {
            let upload = client.upload(&path).await?;
            output::print_upload(&upload, config);
        }
        ImageCommands::List => {
            let images = client.list_images().await?;
            output::print_images(&images, config);
        }
        ImageCommands::Show { id } => {
            let image = client.get_image(&id).await?;
            output::print_image(&image, config);
        }
        ImageCommands::Edit { id, edit_type, intensity } => {
            let edit = client.process_image(&id, edit_type, intensity).await?;
            output::print_edit(&edit, config);
        }
        ImageCommands::Delete { id } => {
            client.delete_image(&id).await?;
            output::print_success(&format!("Deleted image {}", id), config);
        }
        ImageCommands::Download { id, original, output: path } => {
            let bytes = client.download(&id, original).await?;
            tokio::fs::write(&path, &bytes).await?;
            output::print_success(
                &format!("Wrote {} bytes to {}", bytes.len(), path.display()),
                config,
            );
        }
        ImageCommands::Stats => {
            let stats = client.stats().await?;
            output::print_stats(&stats, config);
        }
    }
    Ok(())
}
