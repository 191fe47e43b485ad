//! Command dispatch: decoded envelope → handler call → outbound reply.

use crate::connection::Connection;
use crate::error::{ConnectionError, FramingError, HandlerError};
use crate::framing::MAX_NAME_LENGTH;
use crate::handler::{CommandContext, CommandHandler, HandlerReply, HandlerResult};

use models::{Command, CommandError, InboundTag, OutboundTag};

use log::{debug, warn};

impl Connection {
    pub(super) async fn dispatch(
        &self,
        request_id: Option<String>,
        tag: InboundTag,
        data: Option<&str>,
    ) -> Result<(), ConnectionError> {
        let command = match Command::decode(tag, data) {
            Ok(command) => command,
            Err(e @ CommandError::MalformedUrl { .. }) => {
                warn!("{} from {}: {}", e.command(), self.id(), e);
                self.send(request_id, OutboundTag::ErrorReadingScript, "");
                return Ok(());
            }
            Err(e) => {
                warn!("{} from {}: {}", e.command(), self.id(), e);
                self.send(request_id, OutboundTag::Error, e.reason());
                return Ok(());
            }
        };

        if command.is_reserved() {
            debug!("{} from {} has no handler", tag, self.id());
            return Ok(());
        }

        if command.resets_sender() {
            self.sender().reset();
        }

        let context = CommandContext {
            request_id: request_id.clone(),
            connection_id: self.id().clone(),
            outbound: self.sender().clone(),
        };

        match invoke(self.handler.as_ref(), &context, command).await {
            Ok(HandlerReply::None) => Ok(()),
            Ok(HandlerReply::Message { tag, message }) => {
                self.send(request_id, tag, message);
                Ok(())
            }
            Ok(HandlerReply::File(path)) => match self.send_file(&path).await {
                // The connection survives an unsendable name; tell the requester.
                Err(ConnectionError::Framing(FramingError::NameTooLong { length, .. })) => {
                    self.send(
                        request_id,
                        OutboundTag::Error,
                        format!(
                            "File name is {length} bytes, the limit is {MAX_NAME_LENGTH}"
                        ),
                    );
                    Ok(())
                }
                other => other,
            },
            Err(e) => {
                self.report_failure(request_id, tag, e);
                Ok(())
            }
        }
    }

    fn report_failure(&self, request_id: Option<String>, tag: InboundTag, error: HandlerError) {
        warn!("{} from {} failed: {}", tag, self.id(), error);

        match (tag, &error) {
            (
                InboundTag::SetWatchedVariables | InboundTag::ClearWatchedVariables,
                HandlerError::Execution { .. } | HandlerError::Initialization { .. },
            ) => {
                self.send(request_id, OutboundTag::ErrorSettingWatchedVariables, "");
            }
            (_, HandlerError::Unsupported { .. }) => {
                self.send(request_id, OutboundTag::NoFeature, error.reason());
            }
            _ => {
                self.send(request_id, OutboundTag::Error, error.reason());
            }
        }
    }
}

async fn invoke(
    handler: &dyn CommandHandler,
    ctx: &CommandContext,
    command: Command,
) -> HandlerResult {
    match command {
        Command::GeppettoVersion => handler.geppetto_version(ctx).await,
        Command::LoadProjectFromUrl { url } => handler.load_project_from_url(ctx, url).await,
        Command::LoadProjectFromId {
            project_id,
            experiment_id,
        } => {
            handler
                .load_project_from_id(ctx, project_id, experiment_id)
                .await
        }
        Command::LoadProjectFromContent { content } => {
            handler.load_project_from_content(ctx, content).await
        }
        Command::SaveProject { project_id } => handler.save_project(ctx, project_id).await,
        Command::LoadExperiment(experiment) => handler.load_experiment(ctx, experiment).await,
        Command::RunScript { url } => handler.run_script(ctx, url).await,
        Command::PlayExperiment(experiment) => handler.play_experiment(ctx, experiment).await,
        Command::DeleteExperiment(experiment) => handler.delete_experiment(ctx, experiment).await,
        Command::RunExperiment(experiment) => handler.run_experiment(ctx, experiment).await,
        Command::SetWatchedVariables {
            experiment,
            variables,
        } => {
            handler
                .set_watched_variables(ctx, experiment, variables)
                .await
        }
        Command::ClearWatchedVariables(experiment) => {
            handler.clear_watched_variables(ctx, experiment).await
        }
        Command::IdleUser => handler.idle_user(ctx).await,
        Command::GetModelTree(query) => handler.get_model_tree(ctx, query).await,
        Command::GetSimulationTree(query) => handler.get_simulation_tree(ctx, query).await,
        Command::GetSupportedOutputs(query) => handler.get_supported_outputs(ctx, query).await,
        Command::DownloadModel(request) => handler.download_model(ctx, request).await,
        Command::DownloadResults(request) => handler.download_results(ctx, request).await,
        Command::SetParameters {
            model_aspect_path,
            experiment,
            model_parameters,
        } => {
            handler
                .set_parameters(ctx, model_aspect_path, experiment, model_parameters)
                .await
        }
        Command::LinkDropbox { key } => handler.link_dropbox(ctx, key).await,
        Command::UnlinkDropbox { key } => handler.unlink_dropbox(ctx, key).await,
        Command::UploadModel(request) => handler.upload_model(ctx, request).await,
        Command::UploadResults(request) => handler.upload_results(ctx, request).await,
        Command::ExperimentStatus { data } => handler.experiment_status(ctx, data).await,
        // Reserved commands are filtered out before dispatch.
        Command::Sim | Command::Observe => Ok(HandlerReply::None),
    }
}
