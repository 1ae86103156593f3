// src/scheduler.rs
//! Кооперативный бюджет шага.
//!
//! Каждая стадия владеет своим бюджетом: отработала отведённое время (или
//! заданное число единиц работы), возвращает управление хосту, а на
//! следующем тике продолжает с того же места. Потоков здесь нет.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StepBudget {
    max: Duration,
    max_units: Option<usize>,
    started: Instant,
    units: usize,
}

impl StepBudget {
    #[must_use]
    pub fn new(max_seconds: f32) -> Self {
        Self {
            max: Duration::from_secs_f32(max_seconds.max(0.0)),
            max_units: None,
            started: Instant::now(),
            units: 0,
        }
    }

    /// Вторичный триггер: уступать после `units` единиц работы, даже если время осталось.
    #[must_use]
    pub fn with_unit_limit(mut self, units: usize) -> Self {
        self.max_units = Some(units.max(1));
        self
    }

    /// Бюджет, который никогда не кончается (для прогона без хоста).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max: Duration::MAX,
            max_units: None,
            started: Instant::now(),
            units: 0,
        }
    }

    #[must_use]
    pub fn spent(&self) -> bool {
        self.max_units.is_some_and(|max| self.units >= max) || self.started.elapsed() >= self.max
    }

    pub fn reset(&mut self) {
        self.started = Instant::now();
        self.units = 0;
    }

    /// Отмечает единицу работы и сообщает, пора ли уступить.
    pub fn tick(&mut self) -> bool {
        self.units += 1;
        self.spent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_spent_immediately() {
        let budget = StepBudget::new(0.0);
        assert!(budget.spent());
    }

    #[test]
    fn unit_limit_triggers_yield() {
        let mut budget = StepBudget::new(60.0).with_unit_limit(3);
        assert!(!budget.tick());
        assert!(!budget.tick());
        assert!(budget.tick());

        budget.reset();
        assert!(!budget.spent(), "reset should restart the unit counter");
    }

    #[test]
    fn unlimited_budget_never_spends() {
        let mut budget = StepBudget::unlimited();
        for _ in 0..10_000 {
            assert!(!budget.tick());
        }
    }

    #[test]
    fn time_budget_expires() {
        let budget = StepBudget::new(0.001);
        std::thread::sleep(Duration::from_millis(5));
        assert!(budget.spent());
    }
}
