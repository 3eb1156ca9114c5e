//! 模拟椅子传感器
//!
//! 用于无硬件环境的采集与测试。输出为 MPU9250 原始计数量级，
//! 同一种子产生完全相同的序列。

use contracts::{ChairSensor, ContractError, SensorFamily};

/// Simulated chair configuration
#[derive(Debug, Clone)]
pub struct SimulatedChairConfig {
    /// 传感器名称
    pub name: String,

    /// 随机种子
    pub seed: u64,

    /// 静坐时 acc_z 的均值 (原始计数)
    pub upright_acc_z: f64,

    /// 后仰时 acc_z 的均值
    pub lean_back_acc_z: f64,

    /// 每隔多少次读取进入一次后仰 (0 表示从不后仰)
    pub lean_back_every: u64,

    /// 每次后仰持续的读取次数
    pub lean_back_for: u64,

    /// 噪声幅度 (原始计数)
    pub noise: f64,

    /// 每隔多少次读取失败一次 (0 表示从不失败)
    pub fail_every: u64,
}

impl Default for SimulatedChairConfig {
    fn default() -> Self {
        Self {
            name: "simulated_chair".to_string(),
            seed: 42,
            upright_acc_z: -15910.0,
            lean_back_acc_z: -16300.0,
            lean_back_every: 0,
            lean_back_for: 0,
            noise: 20.0,
            fail_every: 0,
        }
    }
}

/// Deterministic 9-axis chair
pub struct SimulatedChair {
    config: SimulatedChairConfig,
    state: u64,
    reads: u64,
}

impl SimulatedChair {
    pub fn new(config: SimulatedChairConfig) -> Self {
        // xorshift 状态不能为 0
        let state = config.seed.max(1);
        Self {
            config,
            state,
            reads: 0,
        }
    }

    /// Default chair with a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(SimulatedChairConfig {
            seed,
            ..Default::default()
        })
    }

    /// Total `read` calls so far
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn next_noise(&mut self) -> f64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // [-1, 1)
        let unit = (self.state >> 11) as f64 / (1u64 << 53) as f64;
        (unit * 2.0 - 1.0) * self.config.noise
    }

    fn leaning_back(&self, tick: u64) -> bool {
        let every = self.config.lean_back_every;
        every > 0 && tick % every < self.config.lean_back_for
    }
}

impl ChairSensor for SimulatedChair {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn read(&mut self, family: SensorFamily) -> Result<[f64; 3], ContractError> {
        self.reads += 1;
        let fail_every = self.config.fail_every;
        if fail_every > 0 && self.reads % fail_every == 0 {
            return Err(ContractError::Other(format!(
                "{}: i2c read timeout",
                self.config.name
            )));
        }

        // 以加速度计读取次数作为时间刻度
        let tick = self.reads / 3;
        let phase = tick as f64 * 0.05;
        let reading = match family {
            SensorFamily::Acc => {
                let z = if self.leaning_back(tick) {
                    self.config.lean_back_acc_z
                } else {
                    self.config.upright_acc_z
                };
                [
                    120.0 * phase.sin() + self.next_noise(),
                    -80.0 + 60.0 * (phase * 0.7).cos() + self.next_noise(),
                    z + self.next_noise(),
                ]
            }
            SensorFamily::Gyro => [
                self.next_noise() * 0.5,
                self.next_noise() * 0.5,
                15.0 * (phase * 0.3).sin() + self.next_noise() * 0.5,
            ],
            SensorFamily::Mag => [
                40.0 + 5.0 * (phase * 0.1).sin() + self.next_noise() * 0.1,
                -12.0 + self.next_noise() * 0.1,
                95.0 + self.next_noise() * 0.1,
            ],
        };
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimulatedChair::seeded(7);
        let mut b = SimulatedChair::seeded(7);
        for family in SensorFamily::ALL.iter().cycle().take(30) {
            assert_eq!(a.read(*family).unwrap(), b.read(*family).unwrap());
        }
        assert_eq!(a.reads(), 30);
        assert_eq!(a.name(), "simulated_chair");
    }

    #[test]
    fn test_upright_and_lean_back_levels() {
        let mut chair = SimulatedChair::new(SimulatedChairConfig {
            lean_back_every: 10,
            lean_back_for: 5,
            ..Default::default()
        });
        let mut leaning = 0;
        for _ in 0..40 {
            let [_, _, z] = chair.read(SensorFamily::Acc).unwrap();
            chair.read(SensorFamily::Gyro).unwrap();
            chair.read(SensorFamily::Mag).unwrap();
            if z < -16000.0 {
                leaning += 1;
            } else {
                assert!((z + 15910.0).abs() <= 20.0);
            }
        }
        assert_eq!(leaning, 20);
    }

    #[test]
    fn test_periodic_failures() {
        let mut chair = SimulatedChair::new(SimulatedChairConfig {
            fail_every: 4,
            ..Default::default()
        });
        let results: Vec<bool> = (0..8).map(|_| chair.read(SensorFamily::Mag).is_ok()).collect();
        assert_eq!(results, [true, true, true, false, true, true, true, false]);
    }
}
