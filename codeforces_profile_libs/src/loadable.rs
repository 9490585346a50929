/// State of an asynchronously loaded resource. The task id ties an in-flight
/// load to the fetch that started it: a result arriving for any other task id
/// is stale and must be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading { task_id: u64, prev: Option<T> },
    Success { data: T },
    Error { message: String },
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Idle
    }
}

impl<T> Loadable<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Loadable::Success { data } => Some(data),
            _ => None,
        }
    }

    /// The last successful value, surviving an in-flight reload.
    pub fn latest(&self) -> Option<&T> {
        match self {
            Loadable::Success { data } => Some(data),
            Loadable::Loading { prev: Some(prev), .. } => Some(prev),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading { .. })
    }

    pub fn task_id(&self) -> Option<u64> {
        match self {
            Loadable::Loading { task_id, .. } => Some(*task_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Marks the resource as loading under a new task id. The previous
    /// successful value is carried along so consumers can keep showing it
    /// while the reload is in flight.
    pub fn start(&mut self, task_id: u64) {
        let prev = match std::mem::replace(self, Loadable::Idle) {
            Loadable::Success { data } => Some(data),
            Loadable::Loading { prev, .. } => prev,
            _ => None,
        };
        *self = Loadable::Loading { task_id, prev };
    }

    /// Stores the loaded value if `task_id` still matches the in-flight
    /// task. Returns false (and drops the value) when the load has been
    /// superseded by a newer one.
    pub fn finish(&mut self, task_id: u64, data: T) -> bool {
        match self {
            Loadable::Loading { task_id: current, .. } if *current == task_id => {
                *self = Loadable::Success { data };
                true
            }
            _ => false,
        }
    }

    /// Same staleness rule as [`finish`](Self::finish), for the error path.
    pub fn fail(&mut self, task_id: u64, message: impl ToString) -> bool {
        match self {
            Loadable::Loading { task_id: current, .. } if *current == task_id => {
                *self = Loadable::Error {
                    message: message.to_string(),
                };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut loadable: Loadable<u32> = Loadable::Idle;
        loadable.start(1);
        assert!(loadable.is_loading());
        assert_eq!(loadable.task_id(), Some(1));

        assert!(loadable.finish(1, 42));
        assert_eq!(loadable.data(), Some(&42));
    }

    #[test]
    fn test_stale_finish_is_dropped() {
        let mut loadable: Loadable<u32> = Loadable::Idle;
        loadable.start(1);
        loadable.start(2);

        assert!(!loadable.finish(1, 42));
        assert!(loadable.is_loading());

        assert!(loadable.finish(2, 43));
        assert_eq!(loadable.data(), Some(&43));
    }

    #[test]
    fn test_stale_fail_is_dropped() {
        let mut loadable: Loadable<u32> = Loadable::Success { data: 42 };
        loadable.start(3);

        assert!(!loadable.fail(2, "connection reset"));
        assert!(loadable.is_loading());

        assert!(loadable.fail(3, "connection reset"));
        assert_eq!(loadable.error(), Some("connection reset"));
        assert_eq!(loadable.data(), None);
    }

    #[test]
    fn test_reload_keeps_previous_value() {
        let mut loadable: Loadable<u32> = Loadable::Success { data: 42 };
        loadable.start(5);
        assert_eq!(loadable.data(), None);
        assert_eq!(loadable.latest(), Some(&42));
    }
}
