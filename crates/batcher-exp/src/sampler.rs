use batcher_core::ParameterSample;

use crate::spec::Parameter;

/// Lazy cartesian product over the declared parameters.
///
/// The last declared parameter varies fastest. An empty parameter list yields
/// exactly one empty sample.
#[derive(Debug, Clone)]
pub struct GridSampler<'a> {
    params: &'a [Parameter],
    indices: Vec<usize>,
    remaining: usize,
}

impl<'a> GridSampler<'a> {
    pub fn new(params: &'a [Parameter]) -> Self {
        Self {
            params,
            indices: vec![0; params.len()],
            remaining: cardinality(params),
        }
    }

    fn current(&self) -> ParameterSample {
        self.params
            .iter()
            .zip(&self.indices)
            .map(|(param, &idx)| (param.name.clone(), param.values[idx].clone()))
            .collect()
    }

    fn advance(&mut self) {
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.params[pos].values.len() {
                return;
            }
            self.indices[pos] = 0;
        }
    }
}

impl Iterator for GridSampler<'_> {
    type Item = ParameterSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let sample = self.current();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridSampler<'_> {}

/// Product of candidate counts, saturating at `usize::MAX`.
pub fn cardinality(params: &[Parameter]) -> usize {
    params
        .iter()
        .try_fold(1usize, |acc, param| acc.checked_mul(param.values.len()))
        .unwrap_or(usize::MAX)
}

/// Enumerates every parameter combination in odometer order.
pub fn sample(params: &[Parameter]) -> GridSampler<'_> {
    GridSampler::new(params)
}
