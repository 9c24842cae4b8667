//! Member registry: roles, renames and removals.

use super::super::{ChannelActor, User, parse_prefixed_nick};

fn user_key(nick: &str) -> String {
    nick.to_ascii_lowercase()
}

impl ChannelActor {
    pub(crate) fn user(&self, nick: &str) -> Option<&User> {
        self.users.get(&user_key(nick))
    }

    pub(crate) fn handle_set_user(&mut self, raw: &str) -> Option<User> {
        let (role, nick) = parse_prefixed_nick(raw);
        if nick.is_empty() {
            return None;
        }

        let user = User {
            nick: nick.to_string(),
            role,
        };
        self.users.insert(user_key(nick), user.clone());
        Some(user)
    }

    pub(crate) fn handle_rename_user(&mut self, old_nick: &str, new_nick: &str) -> Option<User> {
        let mut user = self.users.remove(&user_key(old_nick))?;
        user.nick = new_nick.to_string();
        self.users.insert(user_key(new_nick), user.clone());
        Some(user)
    }

    pub(crate) fn handle_del_user(&mut self, nick: &str) -> Option<User> {
        self.users.remove(&user_key(nick))
    }
}
