use crate::device::{Device, Result};
use crate::driver::{Driver, LightDesc, LightFlags, LightId, LightType};
use crate::guard;
use crate::paint::ColorValue;

/// A driver light object with plain, unvalidated parameters.
///
/// Field changes have no effect until [`update`](Self::update) pushes them to
/// the driver.
///
/// The device is only used to reach the driver: the light object belongs to
/// the driver, not to the device's context, so its lifetime is tied to the
/// provider (`'p`). Releasing the device unbinds the light from the device's
/// viewport and leaves the light itself valid.
pub struct Light<'p> {
    driver: &'p dyn Driver,
    id: LightId,
    released: bool,

    pub kind: LightType,
    /// Only the RGB channels are used.
    pub color: ColorValue,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub range: f32,
    pub falloff: f32,
    pub linear_attenuation: f32,
    /// Inner cone angle, radians.
    pub theta: f32,
    /// Outer cone angle, radians.
    pub phi: f32,
}

impl<'p> Light<'p> {
    pub fn new(device: &Device<'p>) -> Result<Self> {
        let driver = device.driver();
        let id = guard!(driver.create_light())?;
        log::debug!("light {:?} created", id);

        Ok(Self {
            driver,
            id,
            released: false,
            kind: LightType::default(),
            color: ColorValue::default(),
            position: [0.0; 3],
            direction: [0.0; 3],
            range: 0.0,
            falloff: 0.0,
            linear_attenuation: 0.0,
            theta: 0.0,
            phi: 0.0,
        })
    }

    #[inline]
    pub fn id(&self) -> LightId {
        self.id
    }

    /// Descriptor for the current fields: constant attenuation 1, always active.
    pub fn to_desc(&self) -> LightDesc {
        LightDesc {
            kind: self.kind,
            color: ColorValue::rgb(self.color.r, self.color.g, self.color.b),
            position: self.position,
            direction: self.direction,
            range: self.range,
            falloff: self.falloff,
            attenuation0: 1.0,
            attenuation1: self.linear_attenuation,
            attenuation2: 0.0,
            theta: self.theta,
            phi: self.phi,
            flags: LightFlags::ACTIVE,
        }
    }

    /// Pushes all fields to the driver as one descriptor.
    pub fn update(&self) -> Result<()> {
        guard!(self.driver.set_light(self.id, &self.to_desc()))
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        guard!(self.driver.release_light(self.id))?;
        log::debug!("light {:?} released", self.id);
        Ok(())
    }
}

impl Drop for Light<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = guard!(self.driver.release_light(self.id)) {
            log::warn!("light {:?} leaked: {err}", self.id);
        }
    }
}

impl std::fmt::Debug for Light<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Light")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("color", &self.color)
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{OffscreenProvider, SurfaceProvider};

    #[test]
    fn descriptor_drops_alpha_and_is_active() {
        let provider = OffscreenProvider::new(Default::default()).unwrap();
        let device = provider.create_device().unwrap();
        let mut light = Light::new(&device).unwrap();
        light.kind = LightType::Spot;
        light.color = ColorValue::new(0.5, 0.25, 1.0, 0.75);
        light.linear_attenuation = 0.125;
        light.range = 40.0;

        let d = light.to_desc();
        assert_eq!(d.kind, LightType::Spot);
        assert_eq!(d.color, ColorValue::rgb(0.5, 0.25, 1.0));
        assert_eq!(d.attenuation0, 1.0);
        assert_eq!(d.attenuation1, 0.125);
        assert_eq!(d.attenuation2, 0.0);
        assert_eq!(d.range, 40.0);
        assert_eq!(d.flags, LightFlags::ACTIVE);
    }

    #[test]
    fn fields_reach_the_driver_only_on_update() {
        let provider = OffscreenProvider::new(Default::default()).unwrap();
        let device = provider.create_device().unwrap();
        let mut light = Light::new(&device).unwrap();

        light.position = [1.0, 2.0, 3.0];
        assert_eq!(provider.backend().light_desc(light.id()), None);

        light.update().unwrap();
        let pushed = provider.backend().light_desc(light.id()).unwrap();
        assert_eq!(pushed.position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn light_stays_valid_after_its_device_is_released() {
        let provider = OffscreenProvider::new(Default::default()).unwrap();
        let mut device = provider.create_device().unwrap();
        device
            .attach_viewport(crate::coords::ViewportDesc::full(640, 480))
            .unwrap();
        let mut light = Light::new(&device).unwrap();
        device.add_light(Some(&light)).unwrap();
        device.release().unwrap();

        light.range = 12.0;
        light.update().unwrap();
        assert_eq!(provider.backend().light_desc(light.id()).unwrap().range, 12.0);
        let id = light.id();
        light.release().unwrap();
        assert!(!provider.backend().is_live_light(id));
    }
}
