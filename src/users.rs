use super::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Domain every participant email is derived under.
pub const EMAIL_DOMAIN: &str = "mergington.edu";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    /// Any role string other than `student` or `teacher`.
    #[serde(other)]
    Unrecognized,
}

#[derive(Deserialize, Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl User {
    /// The address this user appears under in participant lists.
    pub fn email(&self) -> String {
        format!("{}@{}", self.username, EMAIL_DOMAIN)
    }
}

/// What the cache was built from. A rewrite that keeps both the
/// modification time and the length is only seen after `reload()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl Stamp {
    fn of(path: &Path) -> Result<Self, Error> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct Cache {
    users: Vec<User>,
    stamp: Stamp,
}

/// User list backed by a JSON file of `[{username, password, role}]`.
///
/// The parsed list is cached together with the file's modification time and
/// length. Every lookup compares them against the file and re-reads it when
/// either differs, so edits to the file are picked up without restarting. If
/// a re-read fails the lookup fails and the previous cache is kept.
pub struct UserStore {
    path: PathBuf,
    cache: Mutex<Cache>,
}

impl UserStore {
    /// Reads the user file once. Errors here are meant to abort startup.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let (users, stamp) = read_users(&path)?;
        log::info!("loaded {} users from {}", users.len(), path.display());

        Ok(Self {
            path,
            cache: Mutex::new(Cache { users, stamp }),
        })
    }

    /// Re-reads the user file unconditionally.
    pub fn reload(&self) -> Result<(), Error> {
        let (users, stamp) = read_users(&self.path)?;
        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned)?;
        cache.users = users;
        cache.stamp = stamp;
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned)?;

        let stamp = Stamp::of(&self.path)?;
        if stamp.modified.is_none() || stamp != cache.stamp {
            log::debug!("user file {} changed, reloading", self.path.display());
            let (users, stamp) = read_users(&self.path)?;
            cache.users = users;
            cache.stamp = stamp;
        }

        Ok(find_user(&cache.users, username).cloned())
    }
}

// The stamp is taken before reading so a concurrent rewrite leaves an older
// stamp behind and is re-read on the next lookup.
fn read_users(path: &Path) -> Result<(Vec<User>, Stamp), Error> {
    let stamp = Stamp::of(path)?;
    let contents = fs::read_to_string(path)?;
    let users: Vec<User> = serde_json::from_str(&contents)?;
    Ok((users, stamp))
}

/// First user whose name matches exactly.
pub fn find_user<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|user| user.username == username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;

    const USERS: &str = r#"[
        {"username": "teacher1", "password": "teach", "role": "teacher"},
        {"username": "daniel", "password": "chess", "role": "student"},
        {"username": "daniel", "password": "shadowed", "role": "teacher"},
        {"username": "janitor", "password": "mop", "role": "staff"}
    ]"#;

    fn write_users(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("users.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(write_users(&dir, USERS)).unwrap();

        let user = store.find_by_username("teacher1").unwrap().unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.email(), "teacher1@mergington.edu");

        assert!(store.find_by_username("nobody").unwrap().is_none());
        assert!(store.find_by_username("Teacher1").unwrap().is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(write_users(&dir, USERS)).unwrap();

        let user = store.find_by_username("daniel").unwrap().unwrap();
        assert_eq!(user.password, "chess");
        assert_eq!(user.role, Role::Student);
    }

    #[test]
    fn test_unknown_role_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(write_users(&dir, USERS)).unwrap();

        let user = store.find_by_username("janitor").unwrap().unwrap();
        assert_eq!(user.role, Role::Unrecognized);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match UserStore::load(dir.path().join("missing.json")) {
            Err(Error::Io(_)) => (),
            _ => panic!("expected io error"),
        }
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        match UserStore::load(write_users(&dir, r#"[{"username": "x"}]"#)) {
            Err(Error::Parse(_)) => (),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(&dir, USERS);
        let store = UserStore::load(&path).unwrap();
        assert!(store.find_by_username("zoe").unwrap().is_none());

        write_users(
            &dir,
            r#"[{"username": "zoe", "password": "pw", "role": "student"}]"#,
        );
        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert!(store.find_by_username("zoe").unwrap().is_some());
        assert!(store.find_by_username("teacher1").unwrap().is_none());
    }

    #[test]
    fn test_rewrite_with_same_mtime_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(
            &dir,
            r#"[{"username": "zoe", "password": "old", "role": "student"}]"#,
        );
        let store = UserStore::load(&path).unwrap();
        let original = fs::metadata(&path).unwrap().modified().unwrap();

        write_users(
            &dir,
            r#"[{"username": "zoe", "password": "revoked-new", "role": "student"}]"#,
        );
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(original)
            .unwrap();

        let user = store.find_by_username("zoe").unwrap().unwrap();
        assert_eq!(user.password, "revoked-new");
    }

    #[test]
    fn test_failed_lookup_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(&dir, USERS);
        let store = UserStore::load(&path).unwrap();

        write_users(&dir, "not json");
        match store.find_by_username("teacher1") {
            Err(Error::Parse(_)) => (),
            other => panic!("expected parse error, got {:?}", other),
        }

        let cache = store.cache.lock().unwrap();
        assert!(find_user(&cache.users, "teacher1").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(&dir, USERS);
        let store = UserStore::load(&path).unwrap();

        write_users(&dir, "not json");
        assert!(store.reload().is_err());

        let cache = store.cache.lock().unwrap();
        assert!(find_user(&cache.users, "teacher1").is_some());
    }
}
