use crate::error::{DotError, Result};
use clap::ValueEnum;
use dot_gpu::{LaunchDims, MAX_THREADS_PER_BLOCK, THREADS_PER_BLOCK};

/// How the per-thread products are combined into one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Every thread adds each of its products to one shared accumulator with
    /// an atomic add.
    #[default]
    Atomic,
    /// Every block reduces its threads' sums in shared memory and writes one
    /// partial; the partials are summed on the host.
    Tree,
}

/// Launch configuration of the dot product routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotConfig {
    /// Threads per block.
    pub block_size: u32,
    /// Upper bound on blocks per grid. `None` launches one thread per element.
    pub max_grid_size: Option<u32>,
    pub strategy: Strategy,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            block_size: THREADS_PER_BLOCK,
            max_grid_size: None,
            strategy: Strategy::Atomic,
        }
    }
}

impl DotConfig {
    /// Checks the parts of the configuration that do not depend on the input.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_THREADS_PER_BLOCK {
            return Err(DotError::InvalidConfig(format!(
                "block size {} is outside 1..={}",
                self.block_size, MAX_THREADS_PER_BLOCK
            )));
        }
        if self.strategy == Strategy::Tree && !self.block_size.is_power_of_two() {
            return Err(DotError::InvalidConfig(format!(
                "tree reduction needs a power of 2 block size, got {}",
                self.block_size
            )));
        }
        if self.max_grid_size == Some(0) {
            return Err(DotError::InvalidConfig(
                "max grid size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Launch shape for `len` elements.
    pub fn launch_dims(&self, len: usize) -> Result<LaunchDims> {
        self.validate()?;
        let dims = LaunchDims::covering(len, self.block_size).ok_or_else(|| {
            DotError::InvalidConfig(format!(
                "{} elements need more blocks of {} threads than a grid holds",
                len, self.block_size
            ))
        })?;
        Ok(match self.max_grid_size {
            Some(max) => dims.with_max_grid_size(max),
            None => dims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_launch_covers_1040_with_five_blocks() {
        let dims = DotConfig::default().launch_dims(1040).unwrap();
        assert_eq!(
            dims,
            LaunchDims {
                grid_size: 5,
                block_size: 256
            }
        );
    }

    #[test]
    fn capped_grid() {
        let config = DotConfig {
            max_grid_size: Some(2),
            ..DotConfig::default()
        };
        assert_eq!(config.launch_dims(100_000).unwrap().grid_size, 2);
    }

    #[test]
    fn rejects_bad_block_sizes() {
        for block_size in [0, MAX_THREADS_PER_BLOCK + 1] {
            let config = DotConfig {
                block_size,
                ..DotConfig::default()
            };
            assert!(matches!(
                config.launch_dims(10),
                Err(DotError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn tree_needs_power_of_two_blocks() {
        let config = DotConfig {
            block_size: 96,
            strategy: Strategy::Tree,
            ..DotConfig::default()
        };
        assert!(matches!(config.validate(), Err(DotError::InvalidConfig(_))));

        let config = DotConfig {
            strategy: Strategy::Atomic,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_grid_cap() {
        let config = DotConfig {
            max_grid_size: Some(0),
            ..DotConfig::default()
        };
        assert!(matches!(config.validate(), Err(DotError::InvalidConfig(_))));
    }
}
