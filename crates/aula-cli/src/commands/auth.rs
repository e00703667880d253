use aula_api_models::ProfileUpdate;
use aula_client::{ClientError, ErrorKind, SessionEvent, SessionState};

use crate::cli::{LoginArgs, OutputFormat, PasswdArgs, ProfileUpdateArgs};
use crate::client::{AppContext, CliError, CliResult, resolve_secret};
use crate::output::{SessionStatus, render_profile, render_session_status};

const NOT_LOGGED_IN: &str = "not logged in; run `aula login <username>` first";

pub(crate) async fn handle_login(
    ctx: &AppContext,
    args: LoginArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    let password = resolve_secret(args.password.as_deref(), "Password: ", "--password")?;

    let profile = ctx
        .client
        .login(username, &password)
        .await
        .map_err(login_error)?;
    render_profile(&profile, format)
}

/// Rejected credentials are not an expired session; report the server's
/// message without the re-login hint.
fn login_error(err: ClientError) -> CliError {
    if err.kind() == ErrorKind::Auth {
        CliError::validation(err.user_message())
    } else {
        err.into()
    }
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.client.logout()?;
    println!("logged out");
    Ok(())
}

pub(crate) async fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    require_token(ctx)?;
    let profile = ctx.client.profile().await?;
    render_profile(&profile, format)
}

pub(crate) async fn handle_status(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let status = session_status(ctx)?;
    render_session_status(&status, format)
}

/// Session state derived from the stored entries alone.
fn session_status(ctx: &AppContext) -> CliResult<SessionStatus> {
    let session = ctx.client.session();
    let has_token = session.access_token()?.is_some();
    let user = if has_token {
        session.cached_user()
    } else {
        None
    };
    let state = user.as_ref().map_or(SessionState::Unauthenticated, |user| {
        SessionState::Unauthenticated.transition(SessionEvent::ProfileLoaded {
            must_change_password: user.debe_cambiar_password,
        })
    });
    Ok(SessionStatus {
        state: state.as_str(),
        username: user.as_ref().map(|user| user.username.clone()),
        role: user.as_ref().map(|user| user.tipo.as_str()),
        must_change_password: state == SessionState::MustChangePassword,
        session_file: Some(ctx.session_file.display().to_string()),
    })
}

pub(crate) async fn handle_passwd(ctx: &AppContext, args: PasswdArgs) -> CliResult<()> {
    require_token(ctx)?;
    let current = resolve_secret(args.current.as_deref(), "Current password: ", "--current")?;
    let new_password = resolve_secret(args.new_password.as_deref(), "New password: ", "--new")?;
    let confirmation = if args.new_password.is_some() {
        new_password.clone()
    } else {
        resolve_secret(None, "Repeat new password: ", "--new")?
    };
    if confirmation != new_password {
        return Err(CliError::validation("new passwords do not match"));
    }
    if current == new_password {
        return Err(CliError::validation(
            "new password must differ from the current one",
        ));
    }

    let response = ctx
        .client
        .change_password(&current, &new_password, &confirmation)
        .await?;
    println!("{}", response.mensaje);
    Ok(())
}

pub(crate) async fn handle_profile_update(
    ctx: &AppContext,
    args: ProfileUpdateArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let update = ProfileUpdate {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        telefono: args.telefono,
        fecha_nacimiento: args.fecha_nacimiento,
        direccion: args.direccion,
    };
    if update.is_empty() {
        return Err(CliError::validation(
            "nothing to update; pass at least one field flag",
        ));
    }
    require_token(ctx)?;
    let profile = ctx.client.update_profile(&update).await?;
    render_profile(&profile, format)
}

fn require_token(ctx: &AppContext) -> CliResult<()> {
    if ctx.client.session().access_token()?.is_none() {
        return Err(CliError::validation(NOT_LOGGED_IN));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_client::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SessionStore, USER_KEY};
    use aula_test_support::fixtures::profile_json;
    use aula_test_support::mocks::{mock_login, mock_profile, mock_refresh, mock_refresh_rejected};
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::commands::harness::{context, logged_in};

    #[tokio::test]
    async fn login_persists_tokens_and_profile() {
        let server = MockServer::start_async().await;
        let login = mock_login(&server, "ana", "s3cret", "acc-1", "ref-1");
        let profile = mock_profile(&server, "acc-1", profile_json(7, "ana", "alumno", false));
        let test = context(&server);

        handle_login(
            &test.ctx,
            LoginArgs {
                username: "ana".into(),
                password: Some("s3cret".into()),
            },
            OutputFormat::Json,
        )
        .await
        .expect("login should succeed");

        login.assert();
        profile.assert();
        let store = test.reopen();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).expect("read"),
            Some("acc-1".to_string())
        );
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).expect("read"),
            Some("ref-1".to_string())
        );
        assert!(store.get(USER_KEY).expect("read").is_some());
    }

    #[tokio::test]
    async fn rejected_credentials_are_validation_errors_without_hint() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(401).json_body(json!({
                "detail": "No active account found with the given credentials"
            }));
        });
        let test = context(&server);

        let err = handle_login(
            &test.ctx,
            LoginArgs {
                username: "ana".into(),
                password: Some("wrong".into()),
            },
            OutputFormat::Table,
        )
        .await
        .expect_err("login should fail");

        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "No active account found with the given credentials"
        );
        assert!(!test.session_file.exists());
    }

    #[tokio::test]
    async fn logout_clears_every_session_entry() {
        let server = MockServer::start_async().await;
        let profile = profile_json(7, "ana", "alumno", false);
        let test = logged_in(&server, "acc", Some("ref"), Some(&profile));

        handle_logout(&test.ctx).expect("logout");

        let store = test.reopen();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            assert_eq!(store.get(key).expect("read"), None);
        }
    }

    #[tokio::test]
    async fn status_reports_forced_password_change_offline() {
        let server = MockServer::start_async().await;
        let profile = profile_json(7, "ana", "alumno", true);
        let test = logged_in(&server, "acc", Some("ref"), Some(&profile));

        let status = session_status(&test.ctx).expect("status");

        assert_eq!(status.state, SessionState::MustChangePassword.as_str());
        assert_eq!(status.username.as_deref(), Some("ana"));
        assert_eq!(status.role, Some("alumno"));
        assert!(status.must_change_password);

        let anonymous = context(&server);
        let status = session_status(&anonymous.ctx).expect("status");
        assert_eq!(status.state, SessionState::Unauthenticated.as_str());
        assert!(status.username.is_none());
    }

    #[tokio::test]
    async fn whoami_refreshes_an_expired_token_and_persists_it() {
        let server = MockServer::start_async().await;
        let expired = server.mock(|when, then| {
            when.method(GET)
                .path("/api/auth/profile/")
                .header("authorization", "Bearer old");
            then.status(401)
                .json_body(json!({"code": "token_not_valid"}));
        });
        let refresh = mock_refresh(&server, "ref", "new");
        let profile = mock_profile(&server, "new", profile_json(7, "ana", "alumno", false));
        let test = logged_in(&server, "old", Some("ref"), None);

        handle_whoami(&test.ctx, OutputFormat::Table)
            .await
            .expect("whoami should recover");

        expired.assert();
        refresh.assert();
        profile.assert();
        assert_eq!(
            test.reopen().get(ACCESS_TOKEN_KEY).expect("read"),
            Some("new".to_string())
        );
    }

    #[tokio::test]
    async fn whoami_with_rejected_refresh_clears_session_and_hints_login() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/profile/");
            then.status(401)
                .json_body(json!({"code": "token_not_valid"}));
        });
        let rejected = mock_refresh_rejected(&server, "stale");
        let profile = profile_json(7, "ana", "alumno", false);
        let test = logged_in(&server, "old", Some("stale"), Some(&profile));

        let err = handle_whoami(&test.ctx, OutputFormat::Table)
            .await
            .expect_err("whoami should fail");

        rejected.assert();
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("aula login"));
        let store = test.reopen();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            assert_eq!(store.get(key).expect("read"), None);
        }
    }

    #[tokio::test]
    async fn whoami_without_session_skips_the_network() {
        let server = MockServer::start_async().await;
        let test = context(&server);

        let err = handle_whoami(&test.ctx, OutputFormat::Table)
            .await
            .expect_err("whoami should fail");

        assert_eq!(err.display_message(), NOT_LOGGED_IN);
    }

    #[tokio::test]
    async fn passwd_posts_confirmation_and_lifts_forced_change() {
        let server = MockServer::start_async().await;
        let change = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/usuarios/cambiar_password/")
                .header("authorization", "Bearer acc")
                .json_body(json!({
                    "password_actual": "Salmo2315",
                    "password_nueva": "nueva-clave",
                    "password_nueva_confirm": "nueva-clave"
                }));
            then.status(200)
                .json_body(json!({"mensaje": "Contraseña actualizada exitosamente"}));
        });
        let profile = profile_json(7, "ana", "alumno", true);
        let test = logged_in(&server, "acc", Some("ref"), Some(&profile));

        handle_passwd(
            &test.ctx,
            PasswdArgs {
                current: Some("Salmo2315".into()),
                new_password: Some("nueva-clave".into()),
            },
        )
        .await
        .expect("password change");

        change.assert();
        let status = session_status(&test.ctx).expect("status");
        assert!(!status.must_change_password);
        assert_eq!(status.state, SessionState::Authenticated.as_str());
    }

    #[tokio::test]
    async fn passwd_rejects_reusing_the_current_password() {
        let server = MockServer::start_async().await;
        let test = logged_in(&server, "acc", None, None);

        let err = handle_passwd(
            &test.ctx,
            PasswdArgs {
                current: Some("same".into()),
                new_password: Some("same".into()),
            },
        )
        .await
        .expect_err("same password should fail");

        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn profile_update_sends_null_for_blank_fields() {
        let server = MockServer::start_async().await;
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/api/auth/profile/")
                .json_body(json!({"telefono": "099 123 456", "fecha_nacimiento": null}));
            then.status(200)
                .json_body(profile_json(7, "ana", "alumno", false));
        });
        let test = logged_in(&server, "acc", None, None);

        handle_profile_update(
            &test.ctx,
            ProfileUpdateArgs {
                telefono: Some("099 123 456".into()),
                fecha_nacimiento: Some(String::new()),
                ..ProfileUpdateArgs::default()
            },
            OutputFormat::Json,
        )
        .await
        .expect("profile update");

        patch.assert();
    }

    #[tokio::test]
    async fn profile_update_requires_a_field() {
        let server = MockServer::start_async().await;
        let test = logged_in(&server, "acc", None, None);

        let err = handle_profile_update(&test.ctx, ProfileUpdateArgs::default(), OutputFormat::Table)
            .await
            .expect_err("empty update should fail");

        assert_eq!(err.exit_code(), 2);
    }
}
