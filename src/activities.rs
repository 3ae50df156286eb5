use super::Error;
use crate::users::Role;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    #[serde(skip)]
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

impl Activity {
    fn new(
        name: &str,
        description: &str,
        schedule: &str,
        max_participants: u32,
        participants: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schedule: schedule.to_string(),
            max_participants,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Point-in-time copy of every activity, in registry order.
///
/// Serializes as a JSON object keyed by activity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activities(Vec<Activity>);

impl Activities {
    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Activities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for activity in &self.0 {
            map.serialize_entry(&activity.name, activity)?;
        }
        map.end()
    }
}

/// In-memory activity records keyed by name.
///
/// Activities are never added or removed after construction; only their
/// participant lists change. Callers share it behind a lock.
#[derive(Debug, Clone)]
pub struct ActivityRegistry {
    activities: Vec<Activity>,
}

impl ActivityRegistry {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// The school's built-in activity list.
    pub fn seeded() -> Self {
        Self::new(vec![
            Activity::new(
                "Chess Club",
                "Learn strategies and compete in chess tournaments",
                "Fridays, 3:30 PM - 5:00 PM",
                12,
                &["michael@mergington.edu", "daniel@mergington.edu"],
            ),
            Activity::new(
                "Programming Class",
                "Learn programming fundamentals and build software projects",
                "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
                20,
                &["emma@mergington.edu", "sophia@mergington.edu"],
            ),
            Activity::new(
                "Gym Class",
                "Physical education and sports activities",
                "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
                30,
                &["john@mergington.edu", "olivia@mergington.edu"],
            ),
            Activity::new(
                "Soccer Team",
                "Join the school soccer team and compete in matches",
                "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                22,
                &["liam@mergington.edu", "noah@mergington.edu"],
            ),
            Activity::new(
                "Basketball Team",
                "Practice and play basketball with the school team",
                "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
                15,
                &["ava@mergington.edu", "mia@mergington.edu"],
            ),
            Activity::new(
                "Art Club",
                "Explore your creativity through painting and drawing",
                "Thursdays, 3:30 PM - 5:00 PM",
                15,
                &["amelia@mergington.edu", "harper@mergington.edu"],
            ),
            Activity::new(
                "Drama Club",
                "Act, direct, and produce plays and performances",
                "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
                20,
                &["ella@mergington.edu", "scarlett@mergington.edu"],
            ),
            Activity::new(
                "Math Club",
                "Solve challenging problems and participate in math competitions",
                "Tuesdays, 3:30 PM - 4:30 PM",
                10,
                &["james@mergington.edu", "benjamin@mergington.edu"],
            ),
            Activity::new(
                "Debate Team",
                "Develop public speaking and argumentation skills",
                "Fridays, 4:00 PM - 5:30 PM",
                12,
                &["charlotte@mergington.edu", "henry@mergington.edu"],
            ),
        ])
    }

    pub fn list_all(&self) -> Activities {
        Activities(self.activities.clone())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Activity, Error> {
        match self.activities.iter_mut().find(|a| a.name == name) {
            Some(v) => Ok(v),
            None => Err(Error::NotFound("Activity not found".to_string())),
        }
    }

    /// Adds `email` to the end of the activity's participant list.
    ///
    /// `max_participants` is not enforced; going over it is only logged.
    ///
    /// # Errors
    /// * `Error::NotFound` - If no activity is called `name`.
    /// * `Error::AlreadySignedUp` - If `email` is already a participant.
    pub fn signup(&mut self, name: &str, email: &str) -> Result<(), Error> {
        let activity = self.get_mut(name)?;

        if activity.participants.iter().any(|p| p == email) {
            return Err(Error::AlreadySignedUp(
                "Student is already signed up".to_string(),
            ));
        }
        activity.participants.push(email.to_string());

        if activity.participants.len() > activity.max_participants as usize {
            log::warn!(
                "{} now has {} participants, over its limit of {}",
                activity.name,
                activity.participants.len(),
                activity.max_participants
            );
        }
        Ok(())
    }

    /// Removes one participant and returns the removed email.
    ///
    /// Teachers remove `target_email`. Students always remove
    /// `requester_email` and `target_email` is ignored.
    ///
    /// # Errors
    /// * `Error::NotFound` - If no activity is called `name`.
    /// * `Error::BadRequest` - If the email to remove is missing or not a participant.
    /// * `Error::Forbidden` - If the role is neither teacher nor student.
    pub fn unregister(
        &mut self,
        name: &str,
        requester_email: &str,
        role: Role,
        target_email: Option<&str>,
    ) -> Result<String, Error> {
        let activity = self.get_mut(name)?;

        let (email, missing) = match role {
            Role::Teacher => (
                target_email.unwrap_or_default(),
                "Target email not found in participants",
            ),
            Role::Student => (requester_email, "You are not signed up for this activity"),
            Role::Unrecognized => return Err(Error::Forbidden("Permission denied.".to_string())),
        };

        let position = match activity.participants.iter().position(|p| p == email) {
            Some(v) if !email.is_empty() => v,
            _ => return Err(Error::BadRequest(missing.to_string())),
        };
        Ok(activity.participants.remove(position))
    }
}
