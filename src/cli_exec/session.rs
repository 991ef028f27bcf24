use rocketbox::model::RemoteConfig;

use super::*;

pub(super) fn handle_login_command(
    store: &LocalStore,
    url: String,
    email: &str,
    password: &str,
) -> Result<()> {
    let remote = RemoteConfig { base_url: url };
    let credentials = RemoteClient::login(&remote, email, password)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let mut cfg = store.read_config()?;
    cfg.remote = Some(remote.clone());
    store.write_config(&cfg)?;
    store
        .set_credentials(&credentials)
        .context("store credentials in session.json")?;

    let client = RemoteClient::new(remote, credentials)?.with_store(store.clone());
    let profile = client
        .fetch_profile()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    store.set_profile(&profile)?;
    println!("Logged in as {} <{}>", profile.nickname, profile.email);
    Ok(())
}

pub(super) fn handle_logout_command(store: &LocalStore) -> Result<()> {
    match connect(store) {
        Ok((client, _)) => {
            if let Err(err) = client.logout() {
                tracing::warn!(error = %err, "server logout failed, forgetting session anyway");
            }
        }
        Err(err) => tracing::debug!(error = %format!("{:#}", err), "no session to log out"),
    }
    store.clear_session()?;
    println!("Logged out");
    Ok(())
}

pub(super) fn handle_whoami_command(store: &LocalStore, json: bool) -> Result<()> {
    let (client, mut session) = connect(store)?;
    let profile = match client.fetch_profile() {
        Ok(profile) => profile,
        Err(err) => return Err(surface(store, &mut session, err.into())),
    };
    store.set_profile(&profile)?;

    if json {
        print_json(&profile, "profile")?;
    } else {
        println!("user: {}", profile.user_id);
        println!("nickname: {}", profile.nickname);
        println!("email: {}", profile.email);
    }
    Ok(())
}
