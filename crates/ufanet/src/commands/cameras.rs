//! Camera command handlers.

use serde::Serialize;
use tabled::Tabled;

use ufanet_core::{Account, Camera, CameraEntity, Entity};

use crate::cli::{CamerasArgs, CamerasCommand, GlobalOpts};
use crate::config::ResolvedAccount;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CameraRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Snapshot")]
    snapshot: &'static str,
}

impl From<&Camera> for CameraRow {
    fn from(camera: &Camera) -> Self {
        Self {
            number: camera.number.clone(),
            name: camera.display_name().to_owned(),
            address: camera.address.clone().unwrap_or_default(),
            snapshot: if camera.snapshot_url().is_some() {
                "yes"
            } else {
                "no"
            },
        }
    }
}

#[derive(Serialize)]
struct StreamInfo {
    unique_id: String,
    name: String,
    stream_url: String,
}

/// Look up a camera by number and wrap it in an entity.
async fn find_camera(account: &Account, number: &str) -> Result<CameraEntity, CliError> {
    let cameras = account.client().list_cameras(account.sink()).await.map_err(ufanet_core::CoreError::from)?;
    cameras
        .into_iter()
        .find(|c| c.number == number)
        .map(|camera| CameraEntity::new(account, camera))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "camera".into(),
            identifier: number.into(),
            list_command: "cameras list".into(),
        })
}

pub async fn handle(
    resolved: &ResolvedAccount,
    args: CamerasArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let account = util::open_account(resolved)?;

    match args.command {
        CamerasCommand::List => {
            let cameras = account.client().list_cameras(account.sink()).await.map_err(ufanet_core::CoreError::from)?;
            let out = output::render_list(
                &global.output,
                &cameras,
                |c: &Camera| CameraRow::from(c),
                |c| c.number.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CamerasCommand::Stream { number } => {
            let mut camera = find_camera(&account, &number).await?;
            let info = StreamInfo {
                unique_id: camera.unique_id().to_owned(),
                name: camera.name().to_owned(),
                stream_url: camera.stream_source().await,
            };
            let out = output::render_single(
                &global.output,
                &info,
                |i| i.stream_url.clone(),
                |i| i.stream_url.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CamerasCommand::Snapshot { number, out } => {
            let mut camera = find_camera(&account, &number).await?;
            let image = camera
                .camera_image()
                .await
                .ok_or_else(|| CliError::ApiError {
                    message: format!("camera {number} returned no snapshot"),
                })?;
            std::fs::write(&out, &image)?;
            output::status(
                &format!("Saved {} bytes to {}", image.len(), out.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
