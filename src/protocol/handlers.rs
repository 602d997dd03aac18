//! Command handlers
//!
//! One handler per verb accepted once the client is logged in. Handlers
//! never touch the network: they return the reply text and, for commands
//! that need the data channel, the work to run once it is connected.

use log::{error, info, warn};
use std::net::SocketAddrV4;

use crate::client::Session;
use crate::error::handlers::error_to_ftp_code;
use crate::error::{FtpServerError, NavigateError, PathError};
use crate::navigate::{FtpPath, change_directory, change_to_parent, resolve};
use crate::protocol::commands::{CommandResult, DataAction, Verb};
use crate::protocol::parser::Command;
use crate::protocol::responses::{self, format_multiline, format_response};
use crate::storage::FileStore;
use crate::transfer::{DataRequest, ListFormat, format_pasv_address, parse_port_argument};

/// Everything a handler may read or change.
pub struct CommandContext<'a, S: FileStore + ?Sized> {
    pub session: &'a mut Session,
    pub store: &'a S,
    /// Endpoint announced by PASV.
    pub passive_endpoint: SocketAddrV4,
}

/// Dispatches a command received in the ready state.
pub fn handle_command<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    command: &Command<'_>,
) -> CommandResult {
    let arg = command.arg();

    match Verb::from_verb(&command.verb) {
        Verb::Cdup => handle_cmd_cdup(ctx),
        Verb::Cwd => handle_cmd_cwd(ctx, arg),
        Verb::Pwd => handle_cmd_pwd(ctx),
        Verb::Quit => CommandResult::close(),
        Verb::Mode => handle_cmd_mode(arg),
        Verb::Stru => handle_cmd_stru(arg),
        Verb::Type => handle_cmd_type(arg),
        Verb::Pasv => handle_cmd_pasv(ctx),
        Verb::Port => handle_cmd_port(arg),
        Verb::Abor => CommandResult::success(format_response(
            responses::TRANSFER_COMPLETE,
            "Data connection closed",
        ))
        .with_data(DataAction::Abort),
        Verb::Dele => handle_cmd_dele(ctx, arg),
        Verb::List => handle_cmd_list(ctx, ListFormat::List),
        Verb::Nlst => handle_cmd_list(ctx, ListFormat::Nlst),
        Verb::Mlsd => handle_cmd_list(ctx, ListFormat::Mlsd),
        Verb::Noop => CommandResult::success(format_response(responses::OK, "Zzz...")),
        Verb::Retr => handle_cmd_retr(ctx, arg),
        Verb::Stor => handle_cmd_stor(ctx, arg),
        Verb::Mkd => handle_cmd_mkd(ctx, arg),
        Verb::Rmd => handle_cmd_rmd(ctx, arg),
        Verb::Rnfr => handle_cmd_rnfr(ctx, arg),
        Verb::Rnto => handle_cmd_rnto(ctx, arg),
        Verb::Feat => CommandResult::success(format_multiline(
            responses::SYSTEM_STATUS,
            &["Extensions supported:", " MLSD", " SIZE", "End."],
        )),
        Verb::Mdtm => CommandResult::failure(format_response(
            responses::FILE_UNAVAILABLE,
            "Unable to retrieve time",
        )),
        Verb::Size => handle_cmd_size(ctx, arg),
        Verb::Site => CommandResult::failure(format!(
            "{} Unknown SITE command {}",
            responses::SYNTAX_ERROR,
            arg
        )),
        Verb::Syst => {
            CommandResult::success(format_response(responses::SYSTEM_TYPE, "UNIX Type: L8"))
        }
        Verb::User | Verb::Pass | Verb::Unknown(_) => handle_cmd_unknown(),
    }
}

fn handle_cmd_unknown() -> CommandResult {
    CommandResult::failure(format_response(responses::SYNTAX_ERROR, "Unknown command"))
}

fn no_file_name() -> CommandResult {
    CommandResult::failure(format_response(
        responses::SYNTAX_ERROR_IN_PARAMETERS,
        "No file name",
    ))
}

fn path_too_long(err: PathError) -> CommandResult {
    warn!("Rejected path: {}", err);
    let err = FtpServerError::from(err);
    CommandResult::failure(format_response(
        error_to_ftp_code(&err),
        "Command line too long",
    ))
}

fn current_directory_reply(cwd: &FtpPath) -> CommandResult {
    CommandResult::success(format!(
        "{} \"{}\" is your current directory",
        responses::PATH_CREATED,
        cwd
    ))
}

fn handle_cmd_cdup<S: FileStore + ?Sized>(ctx: &mut CommandContext<'_, S>) -> CommandResult {
    let parent = change_to_parent(ctx.session.cwd());
    ctx.session.set_cwd(parent);
    CommandResult::success(format!(
        "{} Ok. Current directory is \"{}\"",
        responses::FILE_ACTION_OK,
        ctx.session.cwd()
    ))
}

fn handle_cmd_cwd<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg == "." {
        return current_directory_reply(ctx.session.cwd());
    }

    match change_directory(ctx.store, ctx.session.cwd(), arg) {
        Ok(new_cwd) => {
            info!("Working directory changed to {}", new_cwd);
            let reply = format!(
                "{} CWD Ok. Current directory is \"{}\"",
                responses::FILE_ACTION_OK,
                new_cwd
            );
            ctx.session.set_cwd(new_cwd);
            CommandResult::success(reply)
        }
        Err(NavigateError::Path(err)) => path_too_long(err),
        Err(NavigateError::DirectoryNotFound(_)) => CommandResult::failure(format!(
            "{} directory or file does not exist \"{}\"",
            responses::FILE_UNAVAILABLE,
            arg
        )),
    }
}

fn handle_cmd_pwd<S: FileStore + ?Sized>(ctx: &mut CommandContext<'_, S>) -> CommandResult {
    current_directory_reply(ctx.session.cwd())
}

fn handle_cmd_mode(arg: &str) -> CommandResult {
    if arg == "S" {
        CommandResult::success(format_response(responses::OK, "S Ok"))
    } else {
        CommandResult::failure(format_response(
            responses::PARAMETER_NOT_IMPLEMENTED,
            "Only S(tream) is supported",
        ))
    }
}

fn handle_cmd_stru(arg: &str) -> CommandResult {
    if arg == "F" {
        CommandResult::success(format_response(responses::OK, "F Ok"))
    } else {
        CommandResult::failure(format_response(
            responses::PARAMETER_NOT_IMPLEMENTED,
            "Only F(ile) is supported",
        ))
    }
}

fn handle_cmd_type(arg: &str) -> CommandResult {
    match arg {
        "A" => CommandResult::success(format_response(responses::OK, "TYPE is now ASCII")),
        "I" => CommandResult::success(format_response(
            responses::OK,
            "TYPE is now 8-bit binary",
        )),
        _ => CommandResult::failure(format_response(
            responses::PARAMETER_NOT_IMPLEMENTED,
            "Unknown TYPE",
        )),
    }
}

fn handle_cmd_pasv<S: FileStore + ?Sized>(ctx: &mut CommandContext<'_, S>) -> CommandResult {
    let endpoint = ctx.passive_endpoint;
    CommandResult::success(format!(
        "{} Entering Passive Mode ({}).",
        responses::ENTERING_PASSIVE,
        format_pasv_address(&endpoint)
    ))
    .with_data(DataAction::Passive(endpoint))
}

fn handle_cmd_port(arg: &str) -> CommandResult {
    match parse_port_argument(arg) {
        Ok(addr) => CommandResult::success(format_response(
            responses::OK,
            "PORT command successful",
        ))
        .with_data(DataAction::Active(addr)),
        Err(e) => {
            warn!("{}", e);
            let code = error_to_ftp_code(&FtpServerError::from(e));
            CommandResult::failure(format_response(code, "Can't interpret parameters"))
        }
    }
}

fn handle_cmd_dele<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    // 1. Parameter check
    if arg.is_empty() {
        return no_file_name();
    }

    // 2. Resolve target
    let path = match resolve(ctx.session.cwd(), arg) {
        Ok(path) => path,
        Err(e) => return path_too_long(e),
    };

    // 3. Existence check
    if !ctx.store.exists(&path) {
        return CommandResult::failure(format!(
            "{} File {} not found",
            responses::FILE_UNAVAILABLE,
            arg
        ));
    }

    // 4. Remove
    match ctx.store.remove(&path) {
        Ok(()) => {
            info!("Deleted {}", path);
            CommandResult::success(format!("{} Deleted {}", responses::FILE_ACTION_OK, arg))
        }
        Err(e) => {
            error!("Failed to delete {}: {}", path, e);
            CommandResult::failure(format!(
                "{} Can't delete {}",
                responses::FILE_ACTION_NOT_TAKEN,
                arg
            ))
        }
    }
}

fn handle_cmd_list<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    format: ListFormat,
) -> CommandResult {
    CommandResult::deferred(DataAction::Open(DataRequest::List {
        format,
        dir: ctx.session.cwd().clone(),
    }))
}

fn handle_cmd_retr<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg.is_empty() {
        return no_file_name();
    }

    let path = match resolve(ctx.session.cwd(), arg) {
        Ok(path) => path,
        Err(e) => return path_too_long(e),
    };

    if !ctx.store.exists(&path) {
        return CommandResult::failure(format!(
            "{} File {} not found",
            responses::FILE_UNAVAILABLE,
            arg
        ));
    }

    match ctx.store.open_read(&path) {
        Ok(file) => CommandResult::deferred(DataAction::Open(DataRequest::Retrieve { file, path })),
        Err(e) => {
            error!("Failed to open {}: {}", path, e);
            CommandResult::failure(format!(
                "{} Can't open {}",
                responses::FILE_ACTION_NOT_TAKEN,
                arg
            ))
        }
    }
}

fn handle_cmd_stor<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg.is_empty() {
        return no_file_name();
    }

    match resolve(ctx.session.cwd(), arg) {
        Ok(path) => CommandResult::deferred(DataAction::Open(DataRequest::Store { path })),
        Err(e) => path_too_long(e),
    }
}

fn handle_cmd_mkd<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg.is_empty() {
        return no_file_name();
    }

    let dir = match ctx.session.cwd().child(arg) {
        Ok(dir) => dir,
        Err(e) => return path_too_long(e),
    };

    match ctx.store.mkdir(&dir) {
        Ok(()) => {
            info!("Created directory {}", dir);
            CommandResult::success(format!(
                "{} \"{}\" - Directory successfully created",
                responses::PATH_CREATED,
                arg
            ))
        }
        Err(e) => {
            warn!("Failed to create directory {}: {}", dir, e);
            CommandResult::failure(format!(
                "{} Can't create \"{}\"",
                responses::NOT_IMPLEMENTED,
                arg
            ))
        }
    }
}

fn handle_cmd_rmd<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg.is_empty() {
        return no_file_name();
    }

    let dir = match ctx.session.cwd().child(arg) {
        Ok(dir) => dir,
        Err(e) => return path_too_long(e),
    };

    match ctx.store.rmdir(&dir) {
        Ok(()) => {
            info!("Removed directory {}", dir);
            CommandResult::success(format_response(
                responses::FILE_ACTION_OK,
                "RMD command successful",
            ))
        }
        Err(e) => {
            warn!("Failed to remove directory {}: {}", dir, e);
            CommandResult::failure(format!(
                "{} Can't delete \"{}\"",
                responses::NOT_IMPLEMENTED,
                arg
            ))
        }
    }
}

fn handle_cmd_rnfr<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    ctx.session.take_rename_from();

    if arg.is_empty() {
        return no_file_name();
    }

    let path = match resolve(ctx.session.cwd(), arg) {
        Ok(path) => path,
        Err(e) => return path_too_long(e),
    };

    if !ctx.store.exists(&path) {
        return CommandResult::failure(format!(
            "{} File {} not found",
            responses::FILE_UNAVAILABLE,
            arg
        ));
    }

    ctx.session.set_rename_from(path);
    CommandResult::success(format_response(
        responses::PENDING_FURTHER_INFO,
        "RNFR accepted - file exists, ready for destination",
    ))
}

fn handle_cmd_rnto<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    // The pending source is consumed whatever the outcome.
    let Some(from) = ctx.session.take_rename_from() else {
        return CommandResult::failure(format_response(
            responses::BAD_SEQUENCE,
            "Need RNFR before RNTO",
        ));
    };

    if arg.is_empty() {
        return no_file_name();
    }

    let to = match resolve(ctx.session.cwd(), arg) {
        Ok(path) => path,
        Err(e) => return path_too_long(e),
    };

    if ctx.store.exists(&to) {
        return CommandResult::failure(format!(
            "{} {} already exists",
            responses::FILE_NAME_NOT_ALLOWED,
            arg
        ));
    }

    match ctx.store.rename(&from, &to) {
        Ok(()) => {
            info!("Renamed {} to {}", from, to);
            CommandResult::success(format_response(
                responses::FILE_ACTION_OK,
                "File successfully renamed or moved",
            ))
        }
        Err(e) => {
            error!("Failed to rename {} to {}: {}", from, to, e);
            CommandResult::failure(format_response(
                responses::LOCAL_ERROR,
                "Rename/move failure",
            ))
        }
    }
}

fn handle_cmd_size<S: FileStore + ?Sized>(
    ctx: &mut CommandContext<'_, S>,
    arg: &str,
) -> CommandResult {
    if arg.is_empty() {
        return no_file_name();
    }

    let path = match resolve(ctx.session.cwd(), arg) {
        Ok(path) => path,
        Err(e) => return path_too_long(e),
    };

    match ctx.store.open_read(&path) {
        Ok(file) => CommandResult::success(format!("{} {}", responses::FILE_STATUS, file.size())),
        Err(_) => CommandResult::failure(format!(
            "{} Can't open {}",
            responses::FILE_ACTION_NOT_TAKEN,
            arg
        )),
    }
}
