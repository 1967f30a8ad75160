//! Session behavior against a scripted server.

use std::sync::Mutex;
use std::time::Duration;

use arenabot_session::{
    AccountServer, HttpAccountServer, Session, SessionConfig, SessionError,
};
use arenabot_transport::{ChannelConnection, RemoteEnd, TransportError};
use tokio::time::Instant;

/// Account server double: hands out a fixed assertion, records uploads.
#[derive(Default)]
struct FakeAccounts {
    refuse_login: bool,
    refuse_upload: bool,
    logins: Mutex<Vec<(String, Option<String>, String)>>,
    uploads: Mutex<Vec<(String, String)>>,
}

impl AccountServer for FakeAccounts {
    async fn assertion(
        &self,
        username: &str,
        password: Option<&str>,
        challstr: &str,
    ) -> Result<String, SessionError> {
        self.logins.lock().unwrap().push((
            username.to_string(),
            password.map(str::to_string),
            challstr.to_string(),
        ));
        if self.refuse_login {
            return Err(SessionError::Login("Wrong password.".into()));
        }
        Ok("signed-assertion".into())
    }

    async fn upload_replay(&self, log: &str, id: &str) -> Result<(), SessionError> {
        if self.refuse_upload {
            return Err(SessionError::SaveReplay("upload returned 500".into()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((log.to_string(), id.to_string()));
        Ok(())
    }
}

fn session_with(accounts: FakeAccounts) -> (Session<ChannelConnection, FakeAccounts>, RemoteEnd) {
    let (conn, remote) = ChannelConnection::pair();
    let config = SessionConfig::new("arenabot").with_password("hunter2");
    (Session::new(conn, accounts, config), remote)
}

#[tokio::test]
async fn test_login_claims_identity_after_challstr() {
    let (mut session, remote) = session_with(FakeAccounts::default());
    remote.push("|updateuser| Guest 1|0|1|");
    remote.push("|challstr|4|abcdef");

    session.login().await.unwrap();

    assert_eq!(
        remote.next_sent().await.as_deref(),
        Some("|/trn arenabot,0,signed-assertion")
    );
    let logins = session.account().logins.lock().unwrap().clone();
    assert_eq!(
        logins,
        vec![("arenabot".into(), Some("hunter2".into()), "4|abcdef".into())]
    );
    assert_eq!(
        session.last_message(),
        Some("|/trn arenabot,0,signed-assertion")
    );
}

#[tokio::test]
async fn test_login_refused_is_fatal_and_sends_nothing() {
    let accounts = FakeAccounts {
        refuse_login: true,
        ..FakeAccounts::default()
    };
    let (mut session, remote) = session_with(accounts);
    remote.push("|challstr|4|abcdef");

    let err = session.login().await.unwrap_err();

    assert!(matches!(err, SessionError::Login(_)));
    assert!(remote.sent().await.is_empty());
}

#[tokio::test]
async fn test_login_connection_closed_before_challstr() {
    let (mut session, remote) = session_with(FakeAccounts::default());
    drop(remote);

    let err = session.login().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Transport(TransportError::ConnectionClosed(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_challenge_user_waits_out_interval() {
    let (mut session, remote) = session_with(FakeAccounts::default());

    let start = Instant::now();
    session.challenge_user("Rival", "gen9ou", Some("packed")).await.unwrap();
    assert_eq!(Instant::now(), start);

    tokio::time::advance(Duration::from_secs(2)).await;
    session.challenge_user("Rival", "gen9ou", Some("packed")).await.unwrap();

    assert_eq!(Instant::now() - start, Duration::from_secs(10));
    assert_eq!(
        remote.sent().await,
        vec![
            "|/utm packed",
            "|/challenge Rival,gen9ou",
            "|/utm packed",
            "|/challenge Rival,gen9ou",
        ]
    );
}

#[tokio::test]
async fn test_update_team_random_format_sends_null() {
    let (mut session, remote) = session_with(FakeAccounts::default());

    session
        .search_for_match("gen9randombattle", Some("ignored"))
        .await
        .unwrap();

    assert_eq!(
        remote.sent().await,
        vec!["|/utm null", "|/search gen9randombattle"]
    );
}

#[tokio::test]
async fn test_reject_challenge_with_reason_sends_message() {
    let (mut session, remote) = session_with(FakeAccounts::default());

    session
        .reject_challenge("Rival", Some("No teams available for this format!"))
        .await
        .unwrap();
    session.reject_challenge("Other", None).await.unwrap();

    assert_eq!(
        remote.sent().await,
        vec![
            "|/reject Rival",
            "|/msg Rival,No teams available for this format!",
            "|/reject Other",
        ]
    );
}

#[tokio::test]
async fn test_leave_battle_blocks_until_deinit_for_tag() {
    let (mut session, remote) = session_with(FakeAccounts::default());
    remote.push(">battle-gen9ou-2\n|deinit");
    remote.push(">battle-gen9ou-1\n|c|Rival|ggwp");
    remote.push(">battle-gen9ou-1\n|deinit");
    remote.push("|challstr|4|left-unread");

    session.leave_battle("battle-gen9ou-1", false).await.unwrap();

    assert_eq!(remote.sent().await, vec!["|/leave battle-gen9ou-1"]);
    // The frame after the deinit is still queued.
    let next = session.next_message().await.unwrap();
    assert!(next.raw.contains("left-unread"));
}

#[tokio::test]
async fn test_save_replay_uploads_log() {
    let (mut session, remote) = session_with(FakeAccounts::default());
    remote.push(r#"|queryresponse|savereplay|{"log":"|turn|1","id":"gen9ou-1"}"#);

    session.save_replay("battle-gen9ou-1").await.unwrap();

    assert_eq!(remote.sent().await, vec!["battle-gen9ou-1|/savereplay"]);
    let uploads = session.account().uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("|turn|1".to_string(), "gen9ou-1".to_string())]);
}

#[tokio::test]
async fn test_failed_replay_upload_does_not_stop_leave() {
    let accounts = FakeAccounts {
        refuse_upload: true,
        ..FakeAccounts::default()
    };
    let (mut session, remote) = session_with(accounts);
    remote.push(r#"|queryresponse|savereplay|{"log":"","id":"gen9ou-1"}"#);
    remote.push(">battle-gen9ou-1\n|deinit");

    session.leave_battle("battle-gen9ou-1", true).await.unwrap();

    assert_eq!(
        remote.sent().await,
        vec!["battle-gen9ou-1|/savereplay", "|/leave battle-gen9ou-1"]
    );
}

#[tokio::test]
async fn test_unreachable_replay_server_does_not_stop_leave() {
    let (conn, remote) = ChannelConnection::pair();
    // Nothing listens on port 1.
    let accounts = HttpAccountServer::new("http://127.0.0.1:1/login", "http://127.0.0.1:1/upload");
    let mut session = Session::new(conn, accounts, SessionConfig::new("arenabot"));
    remote.push(r#"|queryresponse|savereplay|{"log":"|turn|1","id":"gen9ou-1"}"#);
    remote.push(">battle-gen9ou-1\n|deinit");

    session.leave_battle("battle-gen9ou-1", true).await.unwrap();

    assert_eq!(
        remote.sent().await,
        vec!["battle-gen9ou-1|/savereplay", "|/leave battle-gen9ou-1"]
    );
}

#[tokio::test]
async fn test_unreadable_replay_payload_does_not_stop_leave() {
    let (mut session, remote) = session_with(FakeAccounts::default());
    remote.push("|queryresponse|savereplay|{not json");
    remote.push(">battle-gen9ou-1\n|deinit");

    session.leave_battle("battle-gen9ou-1", true).await.unwrap();

    assert_eq!(
        remote.sent().await,
        vec!["battle-gen9ou-1|/savereplay", "|/leave battle-gen9ou-1"]
    );
    assert!(session.account().uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_replay_error_is_distinct_from_login_error() {
    let accounts = FakeAccounts {
        refuse_upload: true,
        ..FakeAccounts::default()
    };
    let (mut session, remote) = session_with(accounts);
    remote.push(r#"|queryresponse|savereplay|{"log":"","id":"x"}"#);

    let err = session.save_replay("battle-gen9ou-1").await.unwrap_err();

    assert!(matches!(err, SessionError::SaveReplay(_)));
}
