use std::path::Path;

use gdal::errors::GdalError;
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};

/// An in-memory geocoded raster: every band of the file plus the
/// georeferencing needed to write a matching product back out. Bands are
/// row-major, `rows * cols` values each.
#[derive(Debug, Clone)]
pub struct Raster<T: GdalType + Copy> {
    pub bands: Vec<Vec<T>>,
    pub rows: usize,
    pub cols: usize,
    pub geo_transform: [f64; 6],
    pub projection: String,
    pub no_data: Option<f64>,
}

impl<T: GdalType + Copy + Default> Raster<T> {
    /// Reads every band of a geocoded raster.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Raster<T>, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (cols, rows) = dataset.raster_size();
        let geo_transform = dataset.geo_transform()?;
        let projection = dataset.projection();

        let mut bands = Vec::new();
        let mut no_data = None;
        for index in 1..=dataset.raster_count() {
            let band = dataset.rasterband(index)?;
            if no_data.is_none() {
                no_data = band.no_data_value();
            }
            let buffer = band.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
            bands.push(buffer.data);
        }

        Ok(Raster {
            bands,
            rows,
            cols,
            geo_transform,
            projection,
            no_data,
        })
    }

    /// Writes all bands as a GTiff. The geotransform and nodata carry
    /// over from this raster; the projection is taken from `epsg`.
    pub fn write<P: AsRef<Path>>(&self, path: P, epsg: u32) -> Result<(), GdalError> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<T, _>(
            path.as_ref(),
            self.cols as isize,
            self.rows as isize,
            self.bands.len() as isize,
        )?;
        dataset.set_geo_transform(&self.geo_transform)?;
        dataset.set_spatial_ref(&SpatialRef::from_epsg(epsg)?)?;

        for (index, data) in self.bands.iter().enumerate() {
            let mut band = dataset.rasterband(index as isize + 1)?;
            band.write(
                (0, 0),
                (self.cols, self.rows),
                &Buffer::new((self.cols, self.rows), data.clone()),
            )?;
            if let Some(no_data) = self.no_data {
                band.set_no_data_value(Some(no_data))?;
            }
        }
        Ok(())
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> &[T] {
        &self.bands[index]
    }

    /// A raster with the same shape and georeferencing, zeroed data.
    pub fn empty_clone(&self) -> Raster<T> {
        Raster {
            bands: vec![vec![T::default(); self.rows * self.cols]; self.bands.len()],
            rows: self.rows,
            cols: self.cols,
            geo_transform: self.geo_transform,
            projection: self.projection.clone(),
            no_data: self.no_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn two_band_raster() -> Raster<u16> {
        Raster {
            bands: vec![vec![0, 1, 2, 3, 4, 5], vec![10, 11, 12, 13, 14, 15]],
            rows: 2,
            cols: 3,
            geo_transform: [-93.5, 0.001, 0.0, 29.8, 0.0, -0.001],
            projection: String::new(),
            no_data: Some(0.0),
        }
    }

    #[test]
    fn test_empty_clone_keeps_shape() {
        let raster = two_band_raster();
        let empty = raster.empty_clone();

        assert_eq!(empty.band_count(), 2);
        assert_eq!(empty.rows, 2);
        assert_eq!(empty.cols, 3);
        assert_eq!(empty.geo_transform, raster.geo_transform);
        assert!(empty.band(0).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tif");

        let raster = two_band_raster();
        raster.write(&path, 4326).unwrap();

        let back = Raster::<u16>::read(&path).unwrap();
        assert_eq!(back.rows, 2);
        assert_eq!(back.cols, 3);
        assert_eq!(back.band_count(), 2);
        assert_eq!(back.band(0), raster.band(0));
        assert_eq!(back.band(1), raster.band(1));
        assert_eq!(back.no_data, Some(0.0));
        for (a, b) in back.geo_transform.iter().zip(raster.geo_transform.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(back.projection.contains("WGS 84"));
    }
}
